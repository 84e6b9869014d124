//! # Dashboard Interface
//!
//! Defines the channels shown on the operator dashboard, the values they carry, the frames sent
//! to the dashboard over the network and the transport trait the telemetry registry writes to.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::eqpt::drive::{ChassisVelocity, Pose2d, NUM_MODULES};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Identifier of a channel, assigned by the registry at registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChannelId(pub u32);

/// Rectangle a widget occupies on its tab, in grid cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutRect {
    pub col: u32,
    pub row: u32,
    pub width: u32,
    pub height: u32,
}

/// A named sub-group of channels on a tab, such as the widgets of one swerve module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    pub name: String,
    pub rect: LayoutRect,
}

/// The group a channel belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub tab: Tab,
    pub layout: Option<Layout>,
}

/// Full description of a channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelSpec {
    /// Name of the channel, unique within its group.
    pub name: String,
    pub group: Group,
    pub kind: ChannelKind,
    pub render: RenderHint,

    /// Minimum and maximum of the widget's scale.
    pub range: Option<(f64, f64)>,

    /// Position of the widget, `None` lets the dashboard place it.
    pub rect: Option<LayoutRect>,
}

/// Robot and module poses drawn on the field widget.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldPoses {
    pub robot: Pose2d,
    pub modules: [Pose2d; NUM_MODULES],
}

/// A channel announced to the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelAnnouncement {
    pub id: ChannelId,
    pub spec: ChannelSpec,
}

/// A new value for a channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelUpdate {
    pub id: ChannelId,
    pub value: ChannelValue,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Dashboard tabs, matching the physical layout of the operator's cockpit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tab {
    Drive,
    Power,
    Modules,
}

/// How values reach a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChannelKind {
    /// Number pushed by the orchestrator every cycle.
    Scalar,

    /// Number pulled from a provider each refresh.
    ComputedScalar,

    /// Robot and module poses.
    PoseList,

    /// Structured value with several fields.
    Composite,
}

/// The widget the dashboard should use for a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RenderHint {
    NumberBar,
    Dial,
    VoltageView,
    Graph,
    Field,
    Gyro,
    TextView,
}

/// The value of a channel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ChannelValue {
    Number(f64),
    Poses(FieldPoses),
    Composite(Sendable),
}

/// Structured values shown by composite widgets.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Sendable {
    Gyro { heading_deg: f64 },
    Velocity(ChassisVelocity),
    PowerUsage { total_power_w: f64, total_current_a: f64 },
}

/// Frames sent to the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DashFrame {
    /// Every channel known to the sender. Sent first and then periodically so late subscribers can
    /// build their layout.
    Layout { channels: Vec<ChannelAnnouncement> },

    /// Channel values which changed since the last frame, or every value if `keyframe` is set.
    Values {
        timestamp: DateTime<Utc>,
        keyframe: bool,
        values: Vec<ChannelUpdate>,
    },
}

/// Errors raised by a dashboard transport.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Could not serialize the dashboard frame: {0}")]
    SerializationError(serde_json::Error),

    #[error("Could not send the dashboard frame: {0}")]
    SendError(zmq::Error),

    #[error("Channel {0:?} was pushed but never announced")]
    UnknownChannel(ChannelId),
}

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// Transport between the telemetry registry and the dashboard.
///
/// `announce` and `push` only buffer. `flush` hands buffered data to the network without blocking;
/// intermediate values may be coalesced or dropped, the registry's keyframes make the last value
/// of each channel visible eventually.
pub trait DashTransport {
    /// Tell the dashboard about a new channel.
    fn announce(&mut self, id: ChannelId, spec: &ChannelSpec);

    /// Buffer a value for a channel.
    fn push(&mut self, id: ChannelId, value: &ChannelValue);

    /// Send buffered values. If `keyframe` is set the layout is re-sent ahead of the values.
    fn flush(&mut self, keyframe: bool) -> Result<(), TransportError>;
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl LayoutRect {
    pub const fn new(col: u32, row: u32, width: u32, height: u32) -> Self {
        Self {
            col,
            row,
            width,
            height,
        }
    }
}

impl Group {
    /// A group directly on a tab.
    pub fn tab(tab: Tab) -> Self {
        Self { tab, layout: None }
    }

    /// A named layout on a tab.
    pub fn layout<S: Into<String>>(tab: Tab, name: S, rect: LayoutRect) -> Self {
        Self {
            tab,
            layout: Some(Layout {
                name: name.into(),
                rect,
            }),
        }
    }

    /// Name of the layout, if any.
    pub fn layout_name(&self) -> Option<&str> {
        self.layout.as_ref().map(|l| l.name.as_str())
    }
}

impl ChannelSpec {
    /// Create a new spec with the default render hint for the kind.
    pub fn new<S: Into<String>>(group: Group, name: S, kind: ChannelKind) -> Self {
        let render = match kind {
            ChannelKind::Scalar | ChannelKind::ComputedScalar => RenderHint::TextView,
            ChannelKind::PoseList => RenderHint::Field,
            ChannelKind::Composite => RenderHint::Graph,
        };

        Self {
            name: name.into(),
            group,
            kind,
            render,
            range: None,
            rect: None,
        }
    }

    pub fn with_render(mut self, render: RenderHint) -> Self {
        self.render = render;
        self
    }

    pub fn with_range(mut self, min: f64, max: f64) -> Self {
        self.range = Some((min, max));
        self
    }

    pub fn with_rect(mut self, rect: LayoutRect) -> Self {
        self.rect = Some(rect);
        self
    }
}

impl ChannelValue {
    /// Whether this value can be carried by a channel of the given kind.
    pub fn fits(&self, kind: ChannelKind) -> bool {
        match (self, kind) {
            (ChannelValue::Number(_), ChannelKind::Scalar)
            | (ChannelValue::Number(_), ChannelKind::ComputedScalar)
            | (ChannelValue::Poses(_), ChannelKind::PoseList)
            | (ChannelValue::Composite(_), ChannelKind::Composite) => true,
            _ => false,
        }
    }

    /// The numeric value, if this is a number.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            ChannelValue::Number(n) => Some(*n),
            _ => None,
        }
    }
}
