//! # Dispatch Engine
//!
//! Priority-ordered, chain-per-trigger dispatch.
//!
//! A transaction declares one primary event. The registry runs the full
//! handler chain for that event, highest priority first, manifest order
//! breaking ties. Afterwards it derives any secondary events from the primary
//! event and the payload's declared discriminators, and runs each derived
//! chain the same way, in fixed derivation order.
//!
//! Any handler returning an error aborts the whole dispatch; the caller
//! discards the staged writes, so a late failure is indistinguishable from an
//! early one.

use crate::domain::context::EventContext;
use crate::ports::LedgerState;
use shared_types::enums::{EventKind, SubEventKind};
use shared_types::errors::RuleViolation;
use std::collections::BTreeMap;
use tracing::{debug, trace};

// =============================================================================
// TRIGGERS
// =============================================================================

/// What a handler chain fires on: a primary event or a derived sub-event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Trigger {
    /// A primary event declared by a transaction payload.
    Event(EventKind),
    /// A secondary event derived from the primary event and the payload.
    Sub(SubEventKind),
}

impl Trigger {
    /// Wire string of the underlying (sub-)event.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Event(kind) => kind.as_str(),
            Self::Sub(kind) => kind.as_str(),
        }
    }
}

impl std::fmt::Display for Trigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One declared subscription of a listener.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Subscription {
    /// The trigger the listener fires on.
    pub trigger: Trigger,
    /// Chain position. Higher runs earlier; manifest order breaks ties.
    pub priority: i32,
}

impl Subscription {
    /// Builds a subscription.
    #[must_use]
    pub fn new(trigger: Trigger, priority: i32) -> Self {
        Self { trigger, priority }
    }
}

// =============================================================================
// LISTENERS
// =============================================================================

/// A handler participating in one or more chains.
///
/// Listeners hold no mutable state of their own; everything they need arrives
/// through the context and the ledger, so a registry is freely shareable.
pub trait Listener: Send + Sync {
    /// Stable name, recorded in history entries and logs.
    fn name(&self) -> &'static str;

    /// The chains this listener participates in.
    fn subscriptions(&self) -> Vec<Subscription>;

    /// Handles one firing of a subscribed trigger.
    fn on_event(
        &self,
        trigger: Trigger,
        ctx: &mut EventContext,
        state: &mut dyn LedgerState,
    ) -> Result<(), RuleViolation>;
}

// =============================================================================
// DERIVATION
// =============================================================================

/// Sub-events implied by a primary event and its payload fields.
///
/// Derivation looks only at declared discriminators, never at stored state,
/// so the set of chains to run is fixed before the first handler fires.
#[must_use]
pub fn derive_sub_events(
    event: EventKind,
    fields: &serde_json::Map<String, serde_json::Value>,
) -> Vec<SubEventKind> {
    let declared_asset_type = fields.get("asset_type").and_then(|v| v.as_str());
    SubEventKind::ALL
        .into_iter()
        .filter(|sub| match sub {
            SubEventKind::WorkOrderCreated => {
                event == EventKind::AssetCreated && declared_asset_type == Some("work_order")
            }
            SubEventKind::PackagingCreated => {
                event == EventKind::AssetCreated && declared_asset_type == Some("packaging")
            }
            SubEventKind::SubAssignmentCreated => {
                event == EventKind::AssetCreated && declared_asset_type == Some("sub_assignment")
            }
            SubEventKind::BatchCreated => event == EventKind::WorkOrderAccepted,
            SubEventKind::LogisticsCreated => event == EventKind::AssetsTransferred,
        })
        .collect()
}

// =============================================================================
// REGISTRY
// =============================================================================

/// The immutable handler registry built from a manifest.
pub struct Registry {
    listeners: Vec<Box<dyn Listener>>,
    // Trigger -> ordered (priority desc, manifest order) listener indices.
    chains: BTreeMap<Trigger, Vec<usize>>,
}

impl Registry {
    /// Builds chains from a manifest. The manifest's order is the tie-break
    /// for equal priorities, so the same manifest always yields the same
    /// execution order.
    #[must_use]
    pub fn from_manifest(listeners: Vec<Box<dyn Listener>>) -> Self {
        let mut chains: BTreeMap<Trigger, Vec<(i32, usize)>> = BTreeMap::new();
        for (index, listener) in listeners.iter().enumerate() {
            for sub in listener.subscriptions() {
                chains.entry(sub.trigger).or_default().push((sub.priority, index));
            }
        }
        let chains = chains
            .into_iter()
            .map(|(trigger, mut entries)| {
                // Stable sort keeps manifest order within equal priorities.
                entries.sort_by_key(|(priority, _)| std::cmp::Reverse(*priority));
                (trigger, entries.into_iter().map(|(_, index)| index).collect())
            })
            .collect();
        Self { listeners, chains }
    }

    /// Whether any listener subscribes to `trigger`.
    #[must_use]
    pub fn handles(&self, trigger: Trigger) -> bool {
        self.chains.contains_key(&trigger)
    }

    /// Listener names in execution order for `trigger`. Empty when nothing
    /// subscribes.
    #[must_use]
    pub fn chain_names(&self, trigger: Trigger) -> Vec<&'static str> {
        self.chains
            .get(&trigger)
            .map(|chain| chain.iter().map(|&i| self.listeners[i].name()).collect())
            .unwrap_or_default()
    }

    fn run_chain(
        &self,
        trigger: Trigger,
        ctx: &mut EventContext,
        state: &mut dyn LedgerState,
    ) -> Result<(), RuleViolation> {
        let Some(chain) = self.chains.get(&trigger) else {
            return Ok(());
        };
        debug!(trigger = %trigger, handlers = chain.len(), "running chain");
        for &index in chain {
            let listener = &self.listeners[index];
            trace!(trigger = %trigger, handler = listener.name(), "firing");
            listener.on_event(trigger, ctx, state)?;
        }
        Ok(())
    }

    /// Runs the primary chain, then every derived sub-event chain.
    pub fn dispatch(
        &self,
        ctx: &mut EventContext,
        state: &mut dyn LedgerState,
    ) -> Result<(), RuleViolation> {
        let event = ctx.event();
        self.run_chain(Trigger::Event(event), ctx, state)?;
        for sub in derive_sub_events(event, &ctx.fields().clone()) {
            self.run_chain(Trigger::Sub(sub), ctx, state)?;
        }
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================
