pub struct Icons;

impl Icons {
    pub const CHECK: &str = "✅";
    pub const CROSS: &str = "❌";
    pub const INFO: &str = "ℹ️";
    pub const STATS: &str = "📊";
    pub const PERSON: &str = "👤";
    pub const TASK: &str = "📋";
    pub const NOTE: &str = "📝";
    pub const EMPTY: &str = "∅";
}
