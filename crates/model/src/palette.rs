use shapez_parser::{QuarterColor, QuarterType, ShapeQuarterData};
use shapez_scene::{Color, Material, Shading};
use std::sync::{Arc, OnceLock};

const BASE: u32 = 0x555555;
const CRYSTAL: u32 = 0xdcf4ff;
const CRYSTAL_ALPHA: f32 = 0.75;

fn color_hex(color: QuarterColor) -> u32 {
    match color {
        QuarterColor::Red => 0xee3333,
        QuarterColor::Green => 0x00ee00,
        QuarterColor::Blue => 0x0000ee,
        QuarterColor::Yellow => 0xeeee00,
        QuarterColor::Purple => 0xcc00cc,
        QuarterColor::Cyan => 0x00eeee,
        QuarterColor::White => 0xfafafa,
        QuarterColor::Uncolored => 0x777777,
        // Unpainted parts (pins) share one dark material.
        QuarterColor::Empty => 0x444450,
    }
}

/// Immutable material table. Every mesh painted with a given color holds the
/// same `Arc`.
#[derive(Debug)]
pub struct Palette {
    colors: [Arc<Material>; QuarterColor::ALL.len()],
    crystal: Arc<Material>,
    base: Arc<Material>,
}

static SHARED: OnceLock<Palette> = OnceLock::new();

impl Palette {
    /// The process-wide table, built on first use.
    pub fn shared() -> &'static Palette {
        SHARED.get_or_init(Palette::build)
    }

    fn build() -> Self {
        let colors = QuarterColor::ALL.map(|color| {
            let name = format!("quarter-{}", color.as_char());
            Arc::new(Material::toon(name, color_hex(color)))
        });
        let crystal = Material::new(
            "crystal",
            Color::from_hex(CRYSTAL).with_alpha(CRYSTAL_ALPHA),
            Shading::Glass,
        );
        Self {
            colors,
            crystal: Arc::new(crystal),
            base: Arc::new(Material::toon("base", BASE)),
        }
    }

    pub fn color(&self, color: QuarterColor) -> &Arc<Material> {
        // `ALL` lists the variants in declaration order.
        &self.colors[color as usize]
    }

    pub fn crystal(&self) -> &Arc<Material> {
        &self.crystal
    }

    pub fn base(&self) -> &Arc<Material> {
        &self.base
    }

    /// Material for a quarter. Crystal overrides whatever color was declared.
    pub fn for_quarter(&self, quarter: &ShapeQuarterData) -> Arc<Material> {
        match quarter.kind {
            QuarterType::Crystal => Arc::clone(&self.crystal),
            _ => Arc::clone(self.color(quarter.color)),
        }
    }
}
