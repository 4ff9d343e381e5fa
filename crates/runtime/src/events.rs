use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TickStage {
    TickStarted,
    PricesAdvanced,
    SnapshotPublished,
    AdvanceFailed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TickEvent {
    pub tick: u64,
    pub stage: TickStage,
}

impl TickEvent {
    pub fn new(tick: u64, stage: TickStage) -> Self {
        Self { tick, stage }
    }
}
