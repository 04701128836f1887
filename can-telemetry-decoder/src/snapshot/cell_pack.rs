//! Cell/pack snapshot document (`cell_data.json`)
//!
//! Fed by the legacy 0x6B0-0x6B4 broadcast group.

use crate::codec::{bit, round_to};
use crate::types::Timestamp;
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Extreme cell reading (highest or lowest cell in the pack)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CellReading {
    /// Cell index reported by the BMS
    pub id: u16,
    /// Cell voltage in volts
    pub voltage: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PackData {
    /// State of charge in percent
    pub soc: f64,
    pub cell_count: u16,
    /// Pack voltage in volts
    pub pack_voltage: f64,
    /// Pack current in amps, owned by the high-cell message
    pub pack_current: f64,
}

/// Pack status fields carried by 0x6B0
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PackStatus {
    pub soc: f64,
    pub cell_count: u16,
    pub pack_voltage: f64,
}

/// Temperatures in °C, raw
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TemperatureData {
    pub high_temp: u16,
    pub low_temp: u16,
}

/// 16-bit relay/status word of 0x6B4
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayState {
    pub discharge_relay: bool,
    pub charge_relay: bool,
    pub charger_safety: bool,
    pub malfunction_dtc: bool,
    pub mp_input1: bool,
    pub always_on: bool,
    pub is_ready: bool,
    pub is_charging: bool,
    pub mp_input2: bool,
    pub mp_input3: bool,
    pub reserved: bool,
    pub mp_output2: bool,
    pub mp_output3: bool,
    pub mp_output4: bool,
    pub mp_enable: bool,
    pub mp_output1: bool,
}

impl RelayState {
    pub fn from_raw(raw: u16) -> Self {
        let raw = raw as u32;
        Self {
            discharge_relay: bit(raw, 0),
            charge_relay: bit(raw, 1),
            charger_safety: bit(raw, 2),
            malfunction_dtc: bit(raw, 3),
            mp_input1: bit(raw, 4),
            always_on: bit(raw, 5),
            is_ready: bit(raw, 6),
            is_charging: bit(raw, 7),
            mp_input2: bit(raw, 8),
            mp_input3: bit(raw, 9),
            reserved: bit(raw, 10),
            mp_output2: bit(raw, 11),
            mp_output3: bit(raw, 12),
            mp_output4: bit(raw, 13),
            mp_enable: bit(raw, 14),
            mp_output1: bit(raw, 15),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SystemControl {
    pub relay_state: RelayState,
    /// Charge current limit in amps
    pub pack_ccl: f64,
    /// Discharge current limit in amps
    pub pack_dcl: f64,
}

/// Per-record time of last successful update
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CellPackUpdates {
    pub high_cell: Option<Timestamp>,
    pub low_cell: Option<Timestamp>,
    pub pack_current: Option<Timestamp>,
    pub aux_voltage: Option<Timestamp>,
    pub pack_data: Option<Timestamp>,
    pub temperature_data: Option<Timestamp>,
    pub system_control: Option<Timestamp>,
}

/// Checksum verdict of the last frame applied to each record, `None` before the first
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameChecksums {
    pub pack_data: Option<bool>,
    pub high_cell: Option<bool>,
    pub low_cell: Option<bool>,
    pub temperature_data: Option<bool>,
    pub system_control: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellPackDocument {
    pub timestamp: Timestamp,
    pub high_cell: CellReading,
    pub low_cell: CellReading,
    /// `high_cell.voltage - low_cell.voltage`, 4 decimals
    pub cell_delta: f64,
    /// 12V system voltage
    pub aux_voltage: f64,
    pub pack_data: PackData,
    pub temperature_data: TemperatureData,
    pub system_control: SystemControl,
    pub last_update: CellPackUpdates,
    #[serde(default)]
    pub checksum_ok: FrameChecksums,
    #[serde(skip)]
    pub(crate) revision: u64,
}

impl CellPackDocument {
    pub fn new(created: Timestamp) -> Self {
        Self {
            timestamp: created,
            high_cell: CellReading::default(),
            low_cell: CellReading::default(),
            cell_delta: 0.0,
            aux_voltage: 0.0,
            pack_data: PackData::default(),
            temperature_data: TemperatureData::default(),
            system_control: SystemControl::default(),
            last_update: CellPackUpdates::default(),
            checksum_ok: FrameChecksums::default(),
            revision: 0,
        }
    }

    /// Number of updates applied since creation
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub(crate) fn set_high_cell(&mut self, cell: CellReading, pack_current: f64, checksum_ok: bool, at: Timestamp) {
        self.high_cell = cell;
        self.checksum_ok.high_cell = Some(checksum_ok);
        self.pack_data.pack_current = pack_current;
        self.last_update.high_cell = Some(at);
        self.last_update.pack_current = Some(at);
        self.refresh_delta();
        self.touch(at);
    }

    pub(crate) fn set_low_cell(&mut self, cell: CellReading, aux_voltage: f64, checksum_ok: bool, at: Timestamp) {
        self.low_cell = cell;
        self.checksum_ok.low_cell = Some(checksum_ok);
        self.aux_voltage = aux_voltage;
        self.last_update.low_cell = Some(at);
        self.last_update.aux_voltage = Some(at);
        self.refresh_delta();
        self.touch(at);
    }

    pub(crate) fn set_pack_status(&mut self, status: PackStatus, checksum_ok: bool, at: Timestamp) {
        self.checksum_ok.pack_data = Some(checksum_ok);
        self.pack_data.soc = status.soc;
        self.pack_data.cell_count = status.cell_count;
        self.pack_data.pack_voltage = status.pack_voltage;
        self.last_update.pack_data = Some(at);
        self.touch(at);
    }

    pub(crate) fn set_temperatures(&mut self, temps: TemperatureData, checksum_ok: bool, at: Timestamp) {
        self.temperature_data = temps;
        self.checksum_ok.temperature_data = Some(checksum_ok);
        self.last_update.temperature_data = Some(at);
        self.touch(at);
    }

    pub(crate) fn set_system_control(&mut self, control: SystemControl, checksum_ok: bool, at: Timestamp) {
        self.system_control = control;
        self.checksum_ok.system_control = Some(checksum_ok);
        self.last_update.system_control = Some(at);
        self.touch(at);
    }

    fn refresh_delta(&mut self) {
        self.cell_delta = round_to(self.high_cell.voltage - self.low_cell.voltage, 4);
    }

    fn touch(&mut self, at: Timestamp) {
        self.timestamp = at;
        self.revision += 1;
    }
}

impl Default for CellPackDocument {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}
