//! Dashboard layout
//!
//! Registers every channel shown on the dashboard and keeps their IDs so the telemetry manager can
//! publish to them without looking them up each cycle.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::sync::Arc;

use super::{ChannelRegistry, RegistryError};
use comms_if::{
    dash::{ChannelId, ChannelKind, ChannelSpec, ChannelValue, Group, LayoutRect, RenderHint, Tab},
    eqpt::{
        controller::{Controller, StickAxis},
        drive::NUM_MODULES,
    },
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

const FIELD_RECT: LayoutRect = LayoutRect::new(0, 0, 6, 4);
const GYRO_RECT: LayoutRect = LayoutRect::new(6, 0, 2, 2);
const VELOCITY_RECT: LayoutRect = LayoutRect::new(6, 2, 3, 3);
const CONTROLLER_RECT: LayoutRect = LayoutRect::new(9, 0, 2, 4);

const POWER_USAGE_RECT: LayoutRect = LayoutRect::new(0, 3, 3, 3);

/// Name of the layout holding the controller axes.
pub const CONTROLLER_LAYOUT: &str = "Controller";

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Channels of one module's layout on the Modules tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModuleWidgets {
    pub speed: ChannelId,
    pub angle: ChannelId,
    pub drive_current: ChannelId,
    pub turn_current: ChannelId,
}

/// IDs of every registered channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashLayout {
    // Drive tab
    pub field: ChannelId,
    pub gyro: ChannelId,
    pub velocity: ChannelId,

    /// Controller axes in [`StickAxis::ALL`] order, if a controller was given.
    pub controller: Option<Vec<ChannelId>>,

    // Power tab
    pub voltage: ChannelId,
    pub total_current: ChannelId,
    pub power_usage: ChannelId,

    // Modules tab
    pub modules: Vec<ModuleWidgets>,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Name of the layout of the module with the given index.
pub fn module_layout_name(index: usize) -> String {
    format!("Module {}", index)
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl DashLayout {
    /// Register the dashboard's channels.
    ///
    /// Controller axes are pull channels reading from `controller`, they are left out if no
    /// controller is given.
    pub fn register(
        registry: &mut ChannelRegistry,
        controller: Option<Arc<dyn Controller>>,
    ) -> Result<Self, RegistryError> {
        // ---- DRIVE ----

        let drive = Group::tab(Tab::Drive);

        let field = registry.register(
            ChannelSpec::new(drive.clone(), "Field", ChannelKind::PoseList)
                .with_render(RenderHint::Field)
                .with_rect(FIELD_RECT),
        )?;
        let gyro = registry.register(
            ChannelSpec::new(drive.clone(), "Gyro", ChannelKind::Composite)
                .with_render(RenderHint::Gyro)
                .with_rect(GYRO_RECT),
        )?;
        let velocity = registry.register(
            ChannelSpec::new(drive, "Robot Velocity", ChannelKind::Composite)
                .with_render(RenderHint::Graph)
                .with_rect(VELOCITY_RECT),
        )?;

        let controller = match controller {
            Some(c) => Some(Self::register_controller(registry, c)?),
            None => None,
        };

        // ---- POWER ----

        let power = Group::tab(Tab::Power);

        let voltage = registry.register(
            ChannelSpec::new(power.clone(), "Battery Voltage", ChannelKind::Scalar)
                .with_render(RenderHint::VoltageView)
                .with_range(0.0, 13.0),
        )?;
        let total_current = registry.register(
            ChannelSpec::new(power.clone(), "Total Current", ChannelKind::Scalar)
                .with_render(RenderHint::NumberBar)
                .with_range(0.0, 120.0),
        )?;
        let power_usage = registry.register(
            ChannelSpec::new(power, "Power Usage", ChannelKind::Composite)
                .with_render(RenderHint::Graph)
                .with_rect(POWER_USAGE_RECT),
        )?;

        // ---- MODULES ----

        let mut modules = Vec::with_capacity(NUM_MODULES);
        for i in 0..NUM_MODULES {
            let group = Group::layout(
                Tab::Modules,
                module_layout_name(i),
                LayoutRect::new(2 * i as u32, 0, 2, 4),
            );

            modules.push(ModuleWidgets {
                speed: registry.register(
                    ChannelSpec::new(group.clone(), "Speed", ChannelKind::Scalar)
                        .with_render(RenderHint::NumberBar)
                        .with_range(-5.0, 5.0),
                )?,
                angle: registry.register(
                    ChannelSpec::new(group.clone(), "Angle", ChannelKind::Scalar)
                        .with_render(RenderHint::Dial)
                        .with_range(-180.0, 180.0),
                )?,
                drive_current: registry.register(
                    ChannelSpec::new(group.clone(), "Drive Current", ChannelKind::Scalar)
                        .with_render(RenderHint::NumberBar)
                        .with_range(0.0, 40.0),
                )?,
                turn_current: registry.register(
                    ChannelSpec::new(group, "Turn Current", ChannelKind::Scalar)
                        .with_render(RenderHint::NumberBar)
                        .with_range(0.0, 20.0),
                )?,
            });
        }

        Ok(Self {
            field,
            gyro,
            velocity,
            controller,
            voltage,
            total_current,
            power_usage,
            modules,
        })
    }

    fn register_controller(
        registry: &mut ChannelRegistry,
        controller: Arc<dyn Controller>,
    ) -> Result<Vec<ChannelId>, RegistryError> {
        let group = Group::layout(Tab::Drive, CONTROLLER_LAYOUT, CONTROLLER_RECT);

        let mut ids = Vec::with_capacity(StickAxis::ALL.len());
        for &axis in StickAxis::ALL.iter() {
            let c = controller.clone();
            ids.push(registry.register_pull(
                ChannelSpec::new(group.clone(), axis.label(), ChannelKind::ComputedScalar)
                    .with_render(RenderHint::NumberBar)
                    .with_range(-1.0, 1.0),
                move || c.axis(axis).map(ChannelValue::Number),
            )?);
        }

        Ok(ids)
    }
}
