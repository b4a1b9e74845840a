use super::upstream::UpstreamStatus;

/// Opaque status codes of the upstream listing taxonomy.
pub mod status_id {
    pub const ACQUISITION: u32 = 8809;
    pub const IN_PREPARATION: u32 = 8810;
    pub const MARKETING: u32 = 8811;
    pub const RESERVED: u32 = 8812;
    pub const SOLD: u32 = 8813;
    pub const INACTIVE: u32 = 8814;
    pub const OFFLINE: u32 = 10585;
}

/// Statuses whose listings are shown to visitors ("In Vermarktung").
pub const ACTIVE_STATUS_IDS: &[u32] = &[status_id::MARKETING];

/// Human-readable upstream name for a known status code.
pub fn status_name(id: u32) -> Option<&'static str> {
    match id {
        status_id::ACQUISITION => Some("Akquise"),
        status_id::IN_PREPARATION => Some("In Vorbereitung"),
        status_id::MARKETING => Some("In Vermarktung"),
        status_id::RESERVED => Some("Reserviert"),
        status_id::SOLD => Some("Verkauft"),
        status_id::INACTIVE => Some("Inaktiv"),
        status_id::OFFLINE => Some("Off-Line"),
        _ => None,
    }
}

/// Whether a taxonomy entry's name marks it as publicly marketed.
pub fn is_active_status_name(name: &str) -> bool {
    let lowered = name.trim().to_lowercase();
    lowered.contains("online") || lowered.contains("vermarktung")
}

/// Picks the active status codes out of an upstream taxonomy, keeping its order.
pub fn active_ids_from_taxonomy(statuses: &[UpstreamStatus]) -> Vec<u32> {
    statuses
        .iter()
        .filter(|status| is_active_status_name(&status.name))
        .map(|status| status.id)
        .collect()
}
