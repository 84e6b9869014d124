//! Dashboard channel registry

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, error, info, warn};
use std::collections::HashMap;

// Internal
use super::{FailureStreak, TmCache};
use comms_if::{
    dash::{ChannelId, ChannelKind, ChannelSpec, ChannelValue, DashTransport, Tab, TransportError},
    eqpt::ReadError,
};

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// Source of a pull-style channel's value, read once per refresh.
pub trait ValueProvider {
    fn read(&self) -> Result<ChannelValue, ReadError>;
}

impl<F> ValueProvider for F
where
    F: Fn() -> Result<ChannelValue, ReadError>,
{
    fn read(&self) -> Result<ChannelValue, ReadError> {
        self()
    }
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Registry of every channel shown on the dashboard.
///
/// Channels may only be registered until the registry is sealed, which happens on the first
/// publish, refresh or flush. Published values are written through the cache and forwarded to the
/// transport only when they change.
pub struct ChannelRegistry {
    channels: Vec<Channel>,

    index: HashMap<ChannelKey, ChannelId>,

    /// IDs of channels which have a provider, in registration order.
    pull_ids: Vec<ChannelId>,

    cache: TmCache,

    transport: Box<dyn DashTransport>,

    sealed: bool,

    /// Number of flushes between full re-sends of the cache. Zero disables keyframes.
    keyframe_period: u64,

    num_flushes: u64,
}

struct Channel {
    spec: ChannelSpec,
    provider: Option<Box<dyn ValueProvider>>,
    streak: FailureStreak,
}

/// Uniqueness key of a channel.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ChannelKey {
    tab: Tab,
    layout: Option<String>,
    name: String,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum RegistryError {
    #[error("A channel named \"{name}\" already exists in {tab:?} (layout {layout:?})")]
    DuplicateChannel {
        tab: Tab,
        layout: Option<String>,
        name: String,
    },

    #[error("Channel \"{0}\" of kind {1:?} cannot be registered as a {2} channel")]
    KindMismatch(String, ChannelKind, &'static str),

    #[error("Cannot register channel \"{0}\", the registry is sealed")]
    Sealed(String),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ChannelRegistry {
    /// Create an empty registry writing to the given transport.
    pub fn new(transport: Box<dyn DashTransport>, keyframe_period: u64) -> Self {
        Self {
            channels: Vec::new(),
            index: HashMap::new(),
            pull_ids: Vec::new(),
            cache: TmCache::default(),
            transport,
            sealed: false,
            keyframe_period,
            num_flushes: 0,
        }
    }

    /// Register a channel whose values are published by the caller.
    pub fn register(&mut self, spec: ChannelSpec) -> Result<ChannelId, RegistryError> {
        match spec.kind {
            ChannelKind::Scalar | ChannelKind::PoseList | ChannelKind::Composite => (),
            k => return Err(RegistryError::KindMismatch(spec.name, k, "push")),
        }

        self.insert(spec, None)
    }

    /// Register a channel whose value is read from `provider` on every refresh.
    pub fn register_pull<P>(
        &mut self,
        spec: ChannelSpec,
        provider: P,
    ) -> Result<ChannelId, RegistryError>
    where
        P: ValueProvider + 'static,
    {
        match spec.kind {
            ChannelKind::ComputedScalar | ChannelKind::Composite => (),
            k => return Err(RegistryError::KindMismatch(spec.name, k, "pull")),
        }

        let id = self.insert(spec, Some(Box::new(provider)))?;
        self.pull_ids.push(id);
        Ok(id)
    }

    fn insert(
        &mut self,
        spec: ChannelSpec,
        provider: Option<Box<dyn ValueProvider>>,
    ) -> Result<ChannelId, RegistryError> {
        if self.sealed {
            return Err(RegistryError::Sealed(spec.name));
        }

        let key = ChannelKey {
            tab: spec.group.tab,
            layout: spec.group.layout_name().map(String::from),
            name: spec.name.clone(),
        };

        if self.index.contains_key(&key) {
            return Err(RegistryError::DuplicateChannel {
                tab: key.tab,
                layout: key.layout,
                name: key.name,
            });
        }

        let id = self.cache.add_channel();
        self.transport.announce(id, &spec);
        debug!("Registered channel {:?}: {:?}", id, key);

        self.index.insert(key, id);
        self.channels.push(Channel {
            spec,
            provider,
            streak: FailureStreak::default(),
        });

        Ok(id)
    }

    /// Find a channel by its tab, layout and name.
    pub fn lookup(&self, tab: Tab, layout: Option<&str>, name: &str) -> Option<ChannelId> {
        self.index
            .get(&ChannelKey {
                tab,
                layout: layout.map(String::from),
                name: name.into(),
            })
            .copied()
    }

    pub fn spec(&self, id: ChannelId) -> Option<&ChannelSpec> {
        self.channels.get(id.0 as usize).map(|c| &c.spec)
    }

    /// Last value published to a channel.
    pub fn value(&self, id: ChannelId) -> Option<&ChannelValue> {
        self.cache.get(id)
    }

    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// Publish a new value to a channel.
    ///
    /// Returns `true` if the value changed and was forwarded to the transport.
    pub fn publish(&mut self, id: ChannelId, value: ChannelValue) -> bool {
        self.sealed = true;

        let channel = match self.channels.get(id.0 as usize) {
            Some(c) => c,
            None => {
                error!("Value published to unknown channel {:?}", id);
                return false;
            }
        };

        if !value.fits(channel.spec.kind) {
            error!(
                "Value {:?} does not fit channel \"{}\" of kind {:?}",
                value, channel.spec.name, channel.spec.kind
            );
            return false;
        }

        if self.cache.set(id, value) {
            self.transport.push(id, &value);
            true
        } else {
            false
        }
    }

    /// Read every pull channel's provider and publish the results.
    ///
    /// Returns the number of providers which failed. A failed channel keeps its previous value.
    pub fn refresh(&mut self) -> usize {
        self.sealed = true;

        let mut num_failures = 0;

        for i in 0..self.pull_ids.len() {
            let id = self.pull_ids[i];
            let idx = id.0 as usize;

            let result = match self.channels[idx].provider {
                Some(ref p) => p.read(),
                None => continue,
            };

            match result {
                Ok(value) => {
                    let channel = &mut self.channels[idx];
                    let streak = channel.streak.succeed();
                    if streak > 0 {
                        info!(
                            "Channel \"{}\" recovered after {} failed reads",
                            channel.spec.name, streak
                        );
                    }
                    self.publish(id, value);
                }
                Err(e) => {
                    num_failures += 1;
                    let channel = &mut self.channels[idx];
                    if channel.streak.fail() {
                        warn!(
                            "Could not read channel \"{}\" ({} consecutive failures): {}",
                            channel.spec.name,
                            channel.streak.count(),
                            e
                        );
                    }
                }
            }
        }

        num_failures
    }

    /// Flush buffered values to the transport.
    ///
    /// The first flush and every `keyframe_period`th flush after it are keyframes, on which the
    /// full cache is pushed again.
    pub fn flush(&mut self) -> Result<(), TransportError> {
        self.sealed = true;

        let keyframe = self.keyframe_period > 0 && self.num_flushes % self.keyframe_period == 0;
        self.num_flushes += 1;

        if keyframe {
            for (id, value) in self.cache.iter() {
                self.transport.push(id, value);
            }
        }

        self.transport.flush(keyframe)
    }
}
