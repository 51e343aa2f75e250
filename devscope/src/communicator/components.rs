//! Component aggregates.
//!
//! Each aggregate reads all of its fields, keeps what the device reports
//! and fails with [`Error::NotFound`] only if nothing at all was found.

use log::trace;

use super::Communicator;
use crate::class::{Property, SbcField, Table, UpsField};
use crate::context::OperationContext;
use crate::error::{Error, Result};
use crate::model::{
    Component, Cpu, CpuComponent, DiskComponent, DiskStorage, Fan, HardwareHealthComponent,
    MemoryComponent, PowerSupply, SbcAgent, SbcComponent, SbcRealm, ServerComponent,
    UpsComponent,
};
use crate::reader::group::GroupRow;

impl Communicator {
    /// Table rows, empty if the table is unavailable.
    async fn optional_rows(&self, ctx: &OperationContext, table: Table) -> Result<Vec<GroupRow>> {
        match self.rows(ctx, table, &[]).await {
            Ok(rows) => Ok(rows),
            Err(e) if e.is_unavailable() => {
                trace!("{}: no {table} rows ({})", self.class_name(), e.kind());
                Ok(Vec::new())
            }
            Err(e) => Err(e),
        }
    }

    pub async fn get_cpu_component(&self, ctx: &OperationContext) -> Result<CpuComponent> {
        self.ensure_component(Component::Cpu)?;
        let cpus: Vec<Cpu> = self
            .optional_rows(ctx, Table::Cpu)
            .await?
            .iter()
            .map(Cpu::from_row)
            .collect();
        found_or_not(CpuComponent { cpus }, Component::Cpu)
    }

    pub async fn get_memory_component(&self, ctx: &OperationContext) -> Result<MemoryComponent> {
        self.ensure_component(Component::Memory)?;
        let memory = MemoryComponent {
            usage: self.optional(ctx, Property::MemoryUsage).await?,
        };
        found_or_not(memory, Component::Memory)
    }

    pub async fn get_ups_component(&self, ctx: &OperationContext) -> Result<UpsComponent> {
        self.ensure_component(Component::Ups)?;
        let ups = Property::Ups;
        let component = UpsComponent {
            alarm_low_voltage_disconnect: self
                .optional(ctx, ups(UpsField::AlarmLowVoltageDisconnect))
                .await?,
            battery_amperage: self.optional(ctx, ups(UpsField::BatteryAmperage)).await?,
            battery_capacity: self.optional(ctx, ups(UpsField::BatteryCapacity)).await?,
            battery_current: self.optional(ctx, ups(UpsField::BatteryCurrent)).await?,
            battery_remaining_time: self
                .optional(ctx, ups(UpsField::BatteryRemainingTime))
                .await?,
            battery_temperature: self
                .optional(ctx, ups(UpsField::BatteryTemperature))
                .await?,
            battery_voltage: self.optional(ctx, ups(UpsField::BatteryVoltage)).await?,
            current_load: self.optional(ctx, ups(UpsField::CurrentLoad)).await?,
            mains_voltage_applied: self
                .optional(ctx, ups(UpsField::MainsVoltageApplied))
                .await?,
            rectifier_current: self.optional(ctx, ups(UpsField::RectifierCurrent)).await?,
            system_voltage: self.optional(ctx, ups(UpsField::SystemVoltage)).await?,
        };
        found_or_not(component, Component::Ups)
    }

    pub async fn get_sbc_component(&self, ctx: &OperationContext) -> Result<SbcComponent> {
        self.ensure_component(Component::Sbc)?;
        let sbc = Property::Sbc;
        let component = SbcComponent {
            agents: self
                .optional_rows(ctx, Table::SbcAgents)
                .await?
                .iter()
                .map(SbcAgent::from_row)
                .collect(),
            realms: self
                .optional_rows(ctx, Table::SbcRealms)
                .await?
                .iter()
                .map(SbcRealm::from_row)
                .collect(),
            global_call_per_second: self
                .optional(ctx, sbc(SbcField::GlobalCallPerSecond))
                .await?,
            global_concurrent_sessions: self
                .optional(ctx, sbc(SbcField::GlobalConcurrentSessions))
                .await?,
            active_local_contacts: self
                .optional(ctx, sbc(SbcField::ActiveLocalContacts))
                .await?,
            transcoding_capacity: self
                .optional(ctx, sbc(SbcField::TranscodingCapacity))
                .await?,
            license_capacity: self.optional(ctx, sbc(SbcField::LicenseCapacity)).await?,
            system_redundancy: self.optional(ctx, sbc(SbcField::SystemRedundancy)).await?,
            system_health_score: self
                .optional(ctx, sbc(SbcField::SystemHealthScore))
                .await?,
        };
        found_or_not(component, Component::Sbc)
    }

    pub async fn get_server_component(&self, ctx: &OperationContext) -> Result<ServerComponent> {
        self.ensure_component(Component::Server)?;
        let server = ServerComponent {
            procs: self.optional(ctx, Property::ServerProcs).await?,
            users: self.optional(ctx, Property::ServerUsers).await?,
        };
        found_or_not(server, Component::Server)
    }

    pub async fn get_disk_component(&self, ctx: &OperationContext) -> Result<DiskComponent> {
        self.ensure_component(Component::Disk)?;
        let storages = self
            .optional_rows(ctx, Table::Disk)
            .await?
            .iter()
            .map(DiskStorage::from_row)
            .collect();
        found_or_not(DiskComponent { storages }, Component::Disk)
    }

    pub async fn get_hardware_health_component(
        &self,
        ctx: &OperationContext,
    ) -> Result<HardwareHealthComponent> {
        self.ensure_component(Component::HardwareHealth)?;
        let component = HardwareHealthComponent {
            environment_monitor_state: self
                .optional(ctx, Property::EnvironmentMonitorState)
                .await?,
            fans: self
                .optional_rows(ctx, Table::Fans)
                .await?
                .iter()
                .map(Fan::from_row)
                .collect(),
            power_supply: self
                .optional_rows(ctx, Table::PowerSupply)
                .await?
                .iter()
                .map(PowerSupply::from_row)
                .collect(),
        };
        found_or_not(component, Component::HardwareHealth)
    }
}

fn found_or_not<T: Default + PartialEq>(record: T, component: Component) -> Result<T> {
    if record == T::default() {
        Err(Error::not_found(format!("no {component} data")))
    } else {
        Ok(record)
    }
}
