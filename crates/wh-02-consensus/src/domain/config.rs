/// Consensus channel configuration
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConsensusConfig {
    /// Path of the channel, e.g. `/root/<lao_id>/consensus`
    pub channel_id: String,
    /// Skip voting on prepare/propose while no client is subscribed
    pub abstain_without_clients: bool,
}

impl ConsensusConfig {
    pub fn new(channel_id: impl Into<String>) -> Self {
        Self {
            channel_id: channel_id.into(),
            ..Self::default()
        }
    }
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        Self {
            channel_id: "/root/consensus".to_string(),
            abstain_without_clients: true,
        }
    }
}
