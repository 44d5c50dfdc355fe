use glam::Vec3;
use shapez_assets::QuarterMap;
use shapez_common::{Transform, ViewRect};
use shapez_parser::ShapeData;
use shapez_render::RenderTarget;
use shapez_scene::{
    Color, Geometry, Light, MeshInstance, NodeId, NodeKind, OrbitCamera, SceneGraph,
};
use std::f32::consts::PI;
use std::rc::Rc;
use std::sync::{Arc, OnceLock};

use crate::error::AssemblyError;
use crate::palette::Palette;
use crate::{BASE_OFFSET, LAYER_HEIGHT, LAYER_SCALE_FACTOR, MAX_LAYERS, MAX_QUARTERS, QUARTER_EXPAND_OFFSET};

const BASE_RADIUS: f32 = 0.55;
const BASE_HEIGHT: f32 = 0.1;
const BASE_SEGMENTS: u32 = 32;

/// Cylinder the layers stand on. Shared by every view.
pub fn base_stand() -> Arc<Geometry> {
    static BASE: OnceLock<Arc<Geometry>> = OnceLock::new();
    Arc::clone(BASE.get_or_init(|| {
        Arc::new(Geometry::cylinder("base", BASE_RADIUS, BASE_HEIGHT, BASE_SEGMENTS))
    }))
}

/// A fixed node plus the transform it was created with. Toggles always
/// recompute from `rest`, so collapsing lands back on it exactly.
#[derive(Debug, Clone, Copy)]
struct Slot {
    node: NodeId,
    rest: Transform,
}

#[derive(Debug, Clone)]
struct LayerSlot {
    slot: Slot,
    quarters: Vec<Slot>,
}

/// One viewport's camera, scene and assembled shape.
#[derive(Debug)]
pub struct ShapeView {
    camera: OrbitCamera,
    scene: SceneGraph,
    base: NodeId,
    layers: Vec<LayerSlot>,
    data: ShapeData,
    rect: ViewRect,
    quarters: Option<Rc<QuarterMap>>,
    layers_expanded: bool,
    quarters_expanded: bool,
}

impl ShapeView {
    /// Build the view's fixed structure for `data`. Nothing is attached until
    /// [`ShapeView::initialize`] supplies the quarter fragments.
    pub fn new(data: ShapeData, rect: ViewRect) -> Result<Self, AssemblyError> {
        let mut scene = SceneGraph::new();
        let root = scene.root();

        let lights = scene.add(root, "lights", Transform::default(), NodeKind::Group)?;
        scene.add(
            lights,
            "ambient",
            Transform::default(),
            NodeKind::Light(Light::Ambient {
                color: Color::WHITE,
                intensity: 1.0,
            }),
        )?;
        scene.add(
            lights,
            "sun",
            Transform::from_position(Vec3::new(1.0, 3.0, 1.0)),
            NodeKind::Light(Light::Directional {
                color: Color::WHITE,
                intensity: 2.0,
                cast_shadow: true,
            }),
        )?;

        let mut base_transform = Transform::from_position(Vec3::new(0.0, -BASE_OFFSET, 0.0));
        base_transform.rotate_y(PI * 0.5);
        let stand = MeshInstance {
            geometry: base_stand(),
            material: Arc::clone(Palette::shared().base()),
        };
        let base = scene.add(root, "base", base_transform, NodeKind::Mesh(stand))?;

        let mut layers = Vec::with_capacity(MAX_LAYERS);
        for i in 0..MAX_LAYERS {
            let narrow = 1.0 - i as f32 * LAYER_SCALE_FACTOR;
            let rest = Transform {
                position: Vec3::new(0.0, i as f32 * LAYER_HEIGHT + BASE_OFFSET, 0.0),
                scale: Vec3::new(narrow, 1.0, narrow),
                ..Transform::default()
            };
            let node = scene.add(base, format!("layer-{i}"), rest, NodeKind::Group)?;

            let mut quarters = Vec::with_capacity(MAX_QUARTERS);
            for j in 0..MAX_QUARTERS {
                let mut rest = Transform::default();
                rest.rotate_y(-PI * 0.5 * j as f32);
                let node = scene.add(node, format!("quarter-{i}-{j}"), rest, NodeKind::Group)?;
                quarters.push(Slot { node, rest });
            }
            layers.push(LayerSlot {
                slot: Slot { node, rest },
                quarters,
            });
        }

        let mut camera = OrbitCamera::default();
        camera.set_aspect(rect.aspect());

        Ok(Self {
            camera,
            scene,
            base,
            layers,
            data,
            rect,
            quarters: None,
            layers_expanded: false,
            quarters_expanded: false,
        })
    }

    /// Decode `identifier` and build a view for it.
    pub fn from_identifier(identifier: &str, rect: ViewRect) -> Result<Self, AssemblyError> {
        Self::new(shapez_parser::decode(identifier)?, rect)
    }

    pub fn is_initialized(&self) -> bool {
        self.quarters.is_some()
    }

    /// Hand the view its quarter fragments and assemble the current shape.
    /// Later calls keep the first map.
    pub fn initialize(&mut self, quarters: Rc<QuarterMap>) -> Result<(), AssemblyError> {
        if self.is_initialized() {
            return Ok(());
        }
        self.quarters = Some(quarters);
        self.assemble().map(|_| ())
    }

    pub fn camera(&self) -> &OrbitCamera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut OrbitCamera {
        &mut self.camera
    }

    pub fn scene(&self) -> &SceneGraph {
        &self.scene
    }

    pub fn data(&self) -> &ShapeData {
        &self.data
    }

    pub fn rect(&self) -> ViewRect {
        self.rect
    }

    /// Move the view on the surface; the camera follows the new aspect.
    pub fn set_rect(&mut self, rect: ViewRect) {
        self.rect = rect;
        self.camera.set_aspect(rect.aspect());
    }

    /// Show a different shape. The identifier is decoded before anything is
    /// touched, so a malformed one leaves the current shape in place.
    pub fn assign(&mut self, identifier: &str) -> Result<usize, AssemblyError> {
        if !self.is_initialized() {
            return Err(AssemblyError::NotInitialized);
        }
        let data = shapez_parser::decode(identifier)?;
        self.data = data;
        self.assemble()
    }

    /// Rebuild every quarter slot from the current data. Returns the number of
    /// meshes attached.
    pub fn assemble(&mut self) -> Result<usize, AssemblyError> {
        let quarters = self.quarters.clone().ok_or(AssemblyError::NotInitialized)?;
        self.clear()?;

        let palette = Palette::shared();
        let mut placements = Vec::new();
        for (layer, quarter, data) in self.data.quarters() {
            // Empty quarters have no fragment.
            let Some(fragment) = quarters.get(data.kind) else {
                continue;
            };
            placements.push((layer, quarter, fragment, palette.for_quarter(data)));
        }

        let attached = placements.len();
        for (layer, quarter, fragment, material) in placements {
            let node = self.slot(layer, quarter)?.node;
            self.scene.add(
                node,
                fragment.name(),
                Transform::default(),
                NodeKind::Mesh(fragment.instantiate(material)),
            )?;
        }
        tracing::debug!(
            shape = self.data.identifier(),
            attached,
            "assembled shape"
        );
        Ok(attached)
    }

    /// Detach every mesh from the quarter slots. Slot transforms are kept.
    pub fn clear(&mut self) -> Result<(), AssemblyError> {
        for layer in &self.layers {
            for quarter in &layer.quarters {
                self.scene.clear_children(quarter.node)?;
            }
        }
        Ok(())
    }

    fn slot(&self, layer: usize, quarter: usize) -> Result<&Slot, AssemblyError> {
        self.layers
            .get(layer)
            .and_then(|l| l.quarters.get(quarter))
            .ok_or(AssemblyError::IndexOutOfRange { layer, quarter })
    }

    /// Meshes currently attached under one quarter slot.
    pub fn attached(&self, layer: usize, quarter: usize) -> Result<&[NodeId], AssemblyError> {
        let node = self.slot(layer, quarter)?.node;
        Ok(self.scene.children(node))
    }

    pub fn layer_transform(&self, layer: usize) -> Option<Transform> {
        let node = self.layers.get(layer)?.slot.node;
        self.scene.get(node).map(|n| n.transform)
    }

    pub fn quarter_transform(&self, layer: usize, quarter: usize) -> Option<Transform> {
        let node = self.slot(layer, quarter).ok()?.node;
        self.scene.get(node).map(|n| n.transform)
    }

    pub fn base(&self) -> NodeId {
        self.base
    }

    pub fn layers_expanded(&self) -> bool {
        self.layers_expanded
    }

    pub fn quarters_expanded(&self) -> bool {
        self.quarters_expanded
    }

    pub fn expand_layers(&mut self) {
        self.set_layers_expanded(true);
    }

    pub fn collapse_layers(&mut self) {
        self.set_layers_expanded(false);
    }

    pub fn expand_quarters(&mut self) {
        self.set_quarters_expanded(true);
    }

    pub fn collapse_quarters(&mut self) {
        self.set_quarters_expanded(false);
    }

    fn set_layers_expanded(&mut self, expanded: bool) {
        if self.layers_expanded == expanded {
            return;
        }
        self.layers_expanded = expanded;
        for (i, layer) in self.layers.iter().enumerate() {
            let mut transform = layer.slot.rest;
            if expanded {
                transform.position.y += (i + 1) as f32 * LAYER_HEIGHT;
            }
            if let Some(node) = self.scene.get_mut(layer.slot.node) {
                node.transform = transform;
            }
        }
    }

    fn set_quarters_expanded(&mut self, expanded: bool) {
        if self.quarters_expanded == expanded {
            return;
        }
        self.quarters_expanded = expanded;
        for (i, layer) in self.layers.iter().enumerate() {
            let reach = (i + 1) as f32 * LAYER_SCALE_FACTOR;
            for quarter in &layer.quarters {
                let mut transform = quarter.rest;
                if expanded {
                    transform.position += quarter.rest.rotation * QUARTER_EXPAND_OFFSET * reach;
                }
                if let Some(node) = self.scene.get_mut(quarter.node) {
                    node.transform = transform;
                }
            }
        }
    }
}

impl RenderTarget for ShapeView {
    fn rect(&self) -> ViewRect {
        self.rect
    }

    fn scene(&self) -> &SceneGraph {
        &self.scene
    }

    fn camera(&self) -> &OrbitCamera {
        &self.camera
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;
    use shapez_assets::{ProceduralLoader, QuarterRegistry};
    use shapez_parser::DEFAULT_SHAPE;

    fn quarters() -> Rc<QuarterMap> {
        let registry = QuarterRegistry::new(ProceduralLoader::new());
        block_on(registry.resolve()).unwrap()
    }

    fn ready(identifier: &str) -> ShapeView {
        let mut view = ShapeView::from_identifier(identifier, ViewRect::new(0, 0, 256, 256)).unwrap();
        view.initialize(quarters()).unwrap();
        view
    }

    fn snapshot(view: &ShapeView) -> Vec<Transform> {
        let mut out = Vec::new();
        for i in 0..MAX_LAYERS {
            out.push(view.layer_transform(i).unwrap());
            for j in 0..MAX_QUARTERS {
                out.push(view.quarter_transform(i, j).unwrap());
            }
        }
        out
    }

    #[test]
    fn structure_is_built_up_front() {
        let view = ShapeView::from_identifier(DEFAULT_SHAPE, ViewRect::new(0, 0, 200, 100)).unwrap();
        assert!(!view.is_initialized());
        assert_eq!(view.scene().children(view.base()).len(), MAX_LAYERS);
        assert_eq!(view.scene().lights().len(), 2);
        assert_eq!(view.scene().meshes().len(), 1);
        assert!((view.camera().aspect - 2.0).abs() < 1e-6);

        let top = view.layer_transform(3).unwrap();
        assert!((top.position.y - (3.0 * LAYER_HEIGHT + BASE_OFFSET)).abs() < 1e-6);
        assert!((top.scale.x - (1.0 - 3.0 * LAYER_SCALE_FACTOR)).abs() < 1e-6);
        assert_eq!(top.scale.y, 1.0);
    }

    #[test]
    fn quarter_slots_turn_a_quarter_each() {
        let view = ShapeView::from_identifier(DEFAULT_SHAPE, ViewRect::default()).unwrap();
        let forward = Vec3::X;
        let q1 = view.quarter_transform(0, 1).unwrap().rotation * forward;
        // -90 degrees about Y takes +X to +Z.
        assert!(q1.abs_diff_eq(Vec3::Z, 1e-6));
    }

    #[test]
    fn assembling_before_initialize_fails() {
        let mut view = ShapeView::from_identifier(DEFAULT_SHAPE, ViewRect::default()).unwrap();
        assert_eq!(view.assemble(), Err(AssemblyError::NotInitialized));
        assert_eq!(view.assign("Cu"), Err(AssemblyError::NotInitialized));
        assert_eq!(view.data().identifier(), DEFAULT_SHAPE);
    }

    #[test]
    fn default_shape_attaches_every_quarter() {
        let view = ready(DEFAULT_SHAPE);
        assert!(view.is_initialized());
        // 16 quarters plus the base stand.
        assert_eq!(view.scene().meshes().len(), 17);
        assert_eq!(view.attached(3, 1).unwrap().len(), 1);
    }

    #[test]
    fn crystal_quarters_use_crystal_material() {
        let view = ready("CcRr:crcg");
        let node = view.attached(1, 1).unwrap()[0];
        match &view.scene().get(node).unwrap().kind {
            NodeKind::Mesh(mesh) => {
                assert!(Arc::ptr_eq(&mesh.material, Palette::shared().crystal()));
                assert_eq!(mesh.geometry.name(), "circle-quarter");
            }
            other => panic!("expected a mesh, got {other:?}"),
        }
    }

    #[test]
    fn empty_quarter_stays_clear_across_assignments() {
        let mut view = ready("--");
        assert!(view.attached(0, 0).unwrap().is_empty());

        assert_eq!(view.assign("Cr").unwrap(), 1);
        assert_eq!(view.attached(0, 0).unwrap().len(), 1);

        assert_eq!(view.assign("--").unwrap(), 0);
        assert!(view.attached(0, 0).unwrap().is_empty());
        assert_eq!(view.scene().meshes().len(), 1);
    }

    #[test]
    fn reassignment_replaces_rather_than_accumulates() {
        let mut view = ready(DEFAULT_SHAPE);
        view.assign(DEFAULT_SHAPE).unwrap();
        view.assign(DEFAULT_SHAPE).unwrap();
        assert_eq!(view.scene().meshes().len(), 17);
    }

    #[test]
    fn malformed_assignment_keeps_current_shape() {
        let mut view = ready("CrCr");
        let err = view.assign("Cr:Cr:Cr:Cr:Cr").unwrap_err();
        assert!(matches!(err, AssemblyError::Identifier(_)));
        assert_eq!(view.data().identifier(), "CrCr");
        assert_eq!(view.attached(0, 1).unwrap().len(), 1);
    }

    #[test]
    fn out_of_range_slot_is_reported() {
        let view = ready("Cr");
        assert_eq!(
            view.attached(4, 0),
            Err(AssemblyError::IndexOutOfRange { layer: 4, quarter: 0 })
        );
    }

    #[test]
    fn layer_toggle_round_trips_exactly() {
        let mut view = ready(DEFAULT_SHAPE);
        let before = snapshot(&view);

        view.expand_layers();
        let y0 = view.layer_transform(0).unwrap().position.y;
        assert!((y0 - (BASE_OFFSET + LAYER_HEIGHT)).abs() < 1e-6);
        let y3 = view.layer_transform(3).unwrap().position.y;
        assert!((y3 - (BASE_OFFSET + 7.0 * LAYER_HEIGHT)).abs() < 1e-6);

        view.collapse_layers();
        assert_eq!(snapshot(&view), before);
    }

    #[test]
    fn toggles_are_idempotent() {
        let mut view = ready(DEFAULT_SHAPE);
        view.expand_layers();
        view.expand_quarters();
        let once = snapshot(&view);
        view.expand_layers();
        view.expand_quarters();
        assert_eq!(snapshot(&view), once);

        view.collapse_quarters();
        view.collapse_quarters();
        view.collapse_layers();
        view.collapse_layers();
        assert!(!view.layers_expanded());
        assert!(!view.quarters_expanded());
    }

    #[test]
    fn quarter_toggle_pushes_along_rotated_diagonal() {
        let mut view = ready(DEFAULT_SHAPE);
        let before = snapshot(&view);
        view.expand_quarters();

        let q0 = view.quarter_transform(0, 0).unwrap().position;
        assert!(q0.abs_diff_eq(QUARTER_EXPAND_OFFSET * LAYER_SCALE_FACTOR, 1e-6));
        let q2 = view.quarter_transform(1, 2).unwrap().position;
        let expected = Vec3::new(-0.3, 0.0, -0.3) * 2.0 * LAYER_SCALE_FACTOR;
        assert!(q2.abs_diff_eq(expected, 1e-5));

        view.collapse_quarters();
        assert_eq!(snapshot(&view), before);
    }

    #[test]
    fn toggles_survive_reassignment() {
        let mut view = ready(DEFAULT_SHAPE);
        view.expand_layers();
        let expanded = snapshot(&view);
        view.assign("RuRu:Sg").unwrap();
        assert!(view.layers_expanded());
        assert_eq!(snapshot(&view), expanded);
    }

    #[test]
    fn set_rect_updates_aspect() {
        let mut view = ready("Cr");
        view.set_rect(ViewRect::new(10, 20, 300, 100));
        assert_eq!(view.rect().left, 20);
        assert!((view.camera().aspect - 3.0).abs() < 1e-6);
    }
}
