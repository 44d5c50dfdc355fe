use futures::FutureExt;
use futures::future::{LocalBoxFuture, Shared};
use shapez_parser::QuarterType;
use shapez_scene::{Geometry, Material, MeshInstance};
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;
use std::sync::Arc;

use crate::error::AssetError;
use crate::loader::FragmentLoader;

/// The fixed fragment list, one per drawable type code. Crystal quarters reuse
/// the circle fragment; empty quarters have none.
pub const QUARTER_FRAGMENTS: [(QuarterType, &str); 5] = [
    (QuarterType::Circle, "circle-quarter"),
    (QuarterType::Rect, "rect-quarter"),
    (QuarterType::Wind, "wind-quarter"),
    (QuarterType::Star, "star-quarter"),
    (QuarterType::Pin, "pin-quarter"),
];

/// A loaded fragment. Instantiating it shares the geometry and gives the
/// instance its own material and, once attached, its own parent transform.
#[derive(Debug, Clone)]
pub struct MeshFragment {
    geometry: Arc<Geometry>,
}

impl MeshFragment {
    pub fn new(geometry: Geometry) -> Self {
        Self {
            geometry: Arc::new(geometry),
        }
    }

    pub fn name(&self) -> &str {
        self.geometry.name()
    }

    pub fn geometry(&self) -> &Arc<Geometry> {
        &self.geometry
    }

    pub fn instantiate(&self, material: Arc<Material>) -> MeshInstance {
        MeshInstance {
            geometry: Arc::clone(&self.geometry),
            material,
        }
    }
}

/// Type code to fragment lookup. A miss (empty, or a code with no fragment) is
/// not an error; callers skip it.
#[derive(Debug, Clone, Default)]
pub struct QuarterMap {
    fragments: BTreeMap<QuarterType, MeshFragment>,
}

impl QuarterMap {
    /// Build from geometries in [`QUARTER_FRAGMENTS`] order.
    pub fn from_geometries(geometries: Vec<Geometry>) -> Self {
        let mut fragments = BTreeMap::new();
        for ((kind, _), geometry) in QUARTER_FRAGMENTS.iter().zip(geometries) {
            fragments.insert(*kind, MeshFragment::new(geometry));
        }
        if let Some(circle) = fragments.get(&QuarterType::Circle).cloned() {
            fragments.insert(QuarterType::Crystal, circle);
        }
        Self { fragments }
    }

    pub fn get(&self, kind: QuarterType) -> Option<&MeshFragment> {
        self.fragments.get(&kind)
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }
}

type PendingLoad = Shared<LocalBoxFuture<'static, Result<Rc<QuarterMap>, AssetError>>>;

enum LoadState {
    Idle,
    Loading { generation: u64, pending: PendingLoad },
    Ready(Rc<QuarterMap>),
}

/// Resolves the quarter fragments once and caches the result.
///
/// Construct one per application and share it by reference. Concurrent
/// `resolve()` calls await the same load. A failed load is handed to every
/// waiter and then forgotten, so the next `resolve()` starts a fresh attempt.
pub struct QuarterRegistry {
    loader: Rc<dyn FragmentLoader>,
    state: RefCell<LoadState>,
    generation: Cell<u64>,
}

impl QuarterRegistry {
    pub fn new(loader: impl FragmentLoader + 'static) -> Self {
        Self::with_loader(Rc::new(loader))
    }

    pub fn with_loader(loader: Rc<dyn FragmentLoader>) -> Self {
        Self {
            loader,
            state: RefCell::new(LoadState::Idle),
            generation: Cell::new(0),
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(*self.state.borrow(), LoadState::Ready(_))
    }

    /// The resolved map, without waiting.
    pub fn get(&self) -> Option<Rc<QuarterMap>> {
        match &*self.state.borrow() {
            LoadState::Ready(map) => Some(Rc::clone(map)),
            _ => None,
        }
    }

    /// How many loads have been started so far.
    pub fn attempts(&self) -> u64 {
        self.generation.get()
    }

    pub async fn resolve(&self) -> Result<Rc<QuarterMap>, AssetError> {
        let (generation, pending) = {
            let mut state = self.state.borrow_mut();
            match &*state {
                LoadState::Ready(map) => return Ok(Rc::clone(map)),
                LoadState::Loading {
                    generation,
                    pending,
                } => (*generation, pending.clone()),
                LoadState::Idle => {
                    let generation = self.generation.get() + 1;
                    self.generation.set(generation);
                    let pending = load_quarters(Rc::clone(&self.loader))
                        .boxed_local()
                        .shared();
                    *state = LoadState::Loading {
                        generation,
                        pending: pending.clone(),
                    };
                    (generation, pending)
                }
            }
        };

        let result = pending.await;

        let mut state = self.state.borrow_mut();
        let current = matches!(
            &*state,
            LoadState::Loading { generation: g, .. } if *g == generation
        );
        if current {
            *state = match &result {
                Ok(map) => LoadState::Ready(Rc::clone(map)),
                Err(err) => {
                    tracing::warn!(generation, "quarter fragment load failed: {err}");
                    LoadState::Idle
                }
            };
        }
        result
    }
}

async fn load_quarters(loader: Rc<dyn FragmentLoader>) -> Result<Rc<QuarterMap>, AssetError> {
    tracing::info!(count = QUARTER_FRAGMENTS.len(), "loading quarter fragments");
    let loads = QUARTER_FRAGMENTS
        .iter()
        .map(|(_, name)| loader.load(name));
    let geometries = futures::future::try_join_all(loads).await?;
    let map = QuarterMap::from_geometries(geometries);
    tracing::info!(fragments = map.len(), "quarter fragments ready");
    Ok(Rc::new(map))
}
