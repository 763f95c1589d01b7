use tracing::{debug, info, warn};

use crate::city::{CityEngine, CityRegistry, GridCity};
use crate::eth_codec;
use crate::rollup_lib::{AdvanceData, AdvanceResult, Command, ExecutionEngine, Outcome};

/// Business logic for the city rollup: one city per sender address, mutated
/// by commands decoded from hex-encoded JSON payloads. Generic over the
/// simulation so it can be driven with a fake in tests.
pub struct CityExecutionEngine<E = GridCity> {
    registry: CityRegistry<E>,
}

impl<E: CityEngine> CityExecutionEngine<E> {
    pub fn new() -> Self {
        Self {
            registry: CityRegistry::new(),
        }
    }

    pub fn registry(&self) -> &CityRegistry<E> {
        &self.registry
    }

    fn snapshot_notice(city: &E) -> String {
        eth_codec::uint16_array_to_hex(&city.snapshot_grid(), true)
    }
}

impl<E: CityEngine> Default for CityExecutionEngine<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: CityEngine> ExecutionEngine for CityExecutionEngine<E> {
    fn advance(&mut self, data: &AdvanceData) -> AdvanceResult {
        let sender = &data.metadata.msg_sender;
        info!(%sender, payload = %data.payload, "advance request");

        let decoded = match eth_codec::hex_to_string(&data.payload) {
            Ok(text) => text,
            Err(err) => {
                warn!(%err, "rejecting payload that is not valid hex");
                return AdvanceResult::reject();
            }
        };
        debug!(%decoded, "decoded payload");

        let command = match Command::parse(&decoded) {
            Ok(command) => command,
            Err(err) => {
                warn!(%err, "rejecting undecodable command");
                return AdvanceResult::reject();
            }
        };

        match command {
            Command::CreateCity => {
                if self.registry.exists(sender) {
                    warn!(%sender, "rejecting createCity, sender already has a city");
                    return AdvanceResult::reject();
                }
                let city = self.registry.get_or_create(sender);
                info!(%sender, "city created");
                AdvanceResult::accept_with(vec![Self::snapshot_notice(city)])
            }
            Command::DoTool { tool, x, y } => {
                let Some(city) = self.registry.get_mut(sender) else {
                    warn!(%sender, "rejecting doTool, sender has no city");
                    return AdvanceResult::reject();
                };
                city.apply_tool(tool, x, y);
                info!(%sender, ?tool, x, y, "tool applied");
                AdvanceResult::accept_with(vec![Self::snapshot_notice(city)])
            }
            // unrecognized methods are accepted untouched
            Command::Unknown { method } => {
                debug!(%method, "ignoring unknown method");
                AdvanceResult::accept()
            }
        }
    }

    fn inspect(&self, data: &AdvanceData) -> Outcome {
        info!(
            sender = %data.metadata.msg_sender,
            payload = %data.payload,
            "inspect request"
        );
        Outcome::Accept
    }
}
