//! Borean Tundra creature and object scripts.

pub mod beryl_sorcerer;
pub mod bloodmage_laurith;
pub mod cannoneer;
pub mod caribou_trap;
pub mod hidden_cultist;
pub mod last_rites;
pub mod mammoth_calf;

use crate::scripting::registry::ScriptRegistry;
use crate::world::actor::Entry;

use beryl_sorcerer::{
    BerylSorcerer, NPC_BERYL_SORCERER, NPC_CAPTURED_BERYL_SORCERER, NPC_LIBRARIAN_DONATHAN,
};
use bloodmage_laurith::{BloodmageLaurith, NPC_BLOODMAGE_LAURITH};
use cannoneer::{
    Cannoneer, GO_VALIANCE_KEEP_CANNON_1, GO_VALIANCE_KEEP_CANNON_2, NPC_VALIANCE_KEEP_CANNONEER,
};
use caribou_trap::{CaribouTrap, CARIBOU_TRAPS, GO_HIGH_QUALITY_FUR, NPC_NESINGWARY_TRAPPER};
use hidden_cultist::{HiddenCultist, NPC_GUARD_MITCHELLS, NPC_SALTY_JOHN_THORPE, NPC_TOM_HEGGER};
use last_rites::{
    CounselorTalbot, GeneralArlos, ImageOfLichKing, Leryssa, Thassarian, NPC_COUNSELOR_TALBOT,
    NPC_GENERAL_ARLOS, NPC_IMAGE_LICH_KING, NPC_LERYSSA, NPC_PRINCE_VALANAR, NPC_THASSARIAN,
};
use mammoth_calf::{TrappedMammothCalf, MAMMOTH_TRAPS, NPC_TRAPPED_MAMMOTH_CALF};

/// Every script in the zone, keyed by the entry it drives.
pub fn registry() -> ScriptRegistry {
    let mut registry = ScriptRegistry::new();
    for trap in CARIBOU_TRAPS {
        registry.register::<CaribouTrap>(trap);
    }
    registry
        .register::<Thassarian>(NPC_THASSARIAN)
        .register::<ImageOfLichKing>(NPC_IMAGE_LICH_KING)
        .register::<CounselorTalbot>(NPC_COUNSELOR_TALBOT)
        .register::<GeneralArlos>(NPC_GENERAL_ARLOS)
        .register::<Leryssa>(NPC_LERYSSA)
        .register::<HiddenCultist>(NPC_TOM_HEGGER)
        .register::<HiddenCultist>(NPC_SALTY_JOHN_THORPE)
        .register::<HiddenCultist>(NPC_GUARD_MITCHELLS)
        .register::<Cannoneer>(NPC_VALIANCE_KEEP_CANNONEER)
        .register::<BloodmageLaurith>(NPC_BLOODMAGE_LAURITH)
        .register::<BerylSorcerer>(NPC_BERYL_SORCERER)
        .register::<TrappedMammothCalf>(NPC_TRAPPED_MAMMOTH_CALF);
    registry
}

const NAMED: &[(&str, Entry)] = &[
    ("player", Entry(0)),
    ("caribou_trap", CARIBOU_TRAPS[0]),
    ("high_quality_fur", GO_HIGH_QUALITY_FUR),
    ("nesingwary_trapper", NPC_NESINGWARY_TRAPPER),
    ("thassarian", NPC_THASSARIAN),
    ("image_lich_king", NPC_IMAGE_LICH_KING),
    ("counselor_talbot", NPC_COUNSELOR_TALBOT),
    ("prince_valanar", NPC_PRINCE_VALANAR),
    ("general_arlos", NPC_GENERAL_ARLOS),
    ("leryssa", NPC_LERYSSA),
    ("tom_hegger", NPC_TOM_HEGGER),
    ("salty_john_thorpe", NPC_SALTY_JOHN_THORPE),
    ("guard_mitchells", NPC_GUARD_MITCHELLS),
    ("valiance_keep_cannoneer", NPC_VALIANCE_KEEP_CANNONEER),
    ("valiance_keep_cannon", GO_VALIANCE_KEEP_CANNON_1),
    ("valiance_keep_cannon_2", GO_VALIANCE_KEEP_CANNON_2),
    ("bloodmage_laurith", NPC_BLOODMAGE_LAURITH),
    ("trapped_mammoth_calf", NPC_TRAPPED_MAMMOTH_CALF),
    ("mammoth_trap", MAMMOTH_TRAPS[0]),
    ("beryl_sorcerer", NPC_BERYL_SORCERER),
    ("captured_beryl_sorcerer", NPC_CAPTURED_BERYL_SORCERER),
    ("librarian_donathan", NPC_LIBRARIAN_DONATHAN),
];

/// Entry for a scenario name such as `thassarian` or `caribou_trap`.
pub fn entry_named(name: &str) -> Option<Entry> {
    let name = name.trim().to_ascii_lowercase().replace(['-', ' '], "_");
    NAMED
        .iter()
        .find(|(candidate, _)| *candidate == name)
        .map(|(_, entry)| *entry)
}

/// Display name for an entry, falling back to its number.
pub fn entry_name(entry: Entry) -> String {
    NAMED
        .iter()
        .find(|(_, candidate)| *candidate == entry)
        .map(|(name, _)| (*name).to_string())
        .unwrap_or_else(|| entry.0.to_string())
}
