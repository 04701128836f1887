//! Bus/drive-unit snapshot document (`main_data.json`)
//!
//! Fed by the BMS broadcast (0x351-0x35B) and the drive unit (0x125/0x126).
//! Every record also counts the messages applied to it.

use crate::codec::bit;
use crate::types::Timestamp;
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Charge and discharge ceilings (0x351)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BmsLimits {
    pub charge_voltage_limit: f64,
    pub charge_current_limit: f64,
    pub discharge_current_limit: f64,
    pub discharge_voltage_limit: f64,
}

/// State of charge metrics (0x355)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BmsSoc {
    pub state_of_charge: f64,
    pub state_of_health: f64,
    pub state_of_charge_high_def: f64,
}

/// Pack voltage, current and temperature (0x356)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BmsStatus1 {
    pub pack_voltage: f64,
    pub pack_current: f64,
    pub pack_temperature: f64,
}

/// Fault bit-field (0x35A). Bits 8-15 are reserved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BmsErrors {
    pub p0a07_dischg_limit_enforce: bool,
    pub p0a08_chg_safety_relay: bool,
    pub p0a09_internal_hw_fault: bool,
    pub p0a0a_int_heatsink_fault: bool,
    pub p0a0b_int_sw_fault: bool,
    pub p0a0c_high_cell_fault: bool,
    pub p0a0e_low_cell_fault: bool,
    pub p0a10_pack_hot_fault: bool,
    pub p0a1f_internal_comms_fault: bool,
    pub p0a12_cell_balance_off_fault: bool,
    pub p0a80_weak_cell_fault: bool,
    pub p0afa_low_cell_volt_fault: bool,
    pub p0a04_open_wiring_fault: bool,
    pub p0ac0_current_sensor_fault: bool,
    pub p0a0d_high_cell_5v_fault: bool,
    pub p0a0f_cell_asic_fault: bool,
    pub p0a02_weak_pack_fault: bool,
    pub p0a81_fan_monitor_fault: bool,
    pub p0a9c_thermistor_fault: bool,
    pub u0100_external_comms: bool,
    pub p0560_redundant_psu_fault: bool,
    pub p0aa6_hv_isolation_fault: bool,
    pub p0a05_input_psu_fault: bool,
    pub p0a06_chg_limit_enforce_fault: bool,
}

impl BmsErrors {
    pub fn from_raw(raw: u32) -> Self {
        Self {
            p0a07_dischg_limit_enforce: bit(raw, 0),
            p0a08_chg_safety_relay: bit(raw, 1),
            p0a09_internal_hw_fault: bit(raw, 2),
            p0a0a_int_heatsink_fault: bit(raw, 3),
            p0a0b_int_sw_fault: bit(raw, 4),
            p0a0c_high_cell_fault: bit(raw, 5),
            p0a0e_low_cell_fault: bit(raw, 6),
            p0a10_pack_hot_fault: bit(raw, 7),
            p0a1f_internal_comms_fault: bit(raw, 16),
            p0a12_cell_balance_off_fault: bit(raw, 17),
            p0a80_weak_cell_fault: bit(raw, 18),
            p0afa_low_cell_volt_fault: bit(raw, 19),
            p0a04_open_wiring_fault: bit(raw, 20),
            p0ac0_current_sensor_fault: bit(raw, 21),
            p0a0d_high_cell_5v_fault: bit(raw, 22),
            p0a0f_cell_asic_fault: bit(raw, 23),
            p0a02_weak_pack_fault: bit(raw, 24),
            p0a81_fan_monitor_fault: bit(raw, 25),
            p0a9c_thermistor_fault: bit(raw, 26),
            u0100_external_comms: bit(raw, 27),
            p0560_redundant_psu_fault: bit(raw, 28),
            p0aa6_hv_isolation_fault: bit(raw, 29),
            p0a05_input_psu_fault: bit(raw, 30),
            p0a06_chg_limit_enforce_fault: bit(raw, 31),
        }
    }

    /// True when any fault bit is set
    pub fn any(&self) -> bool {
        *self != Self::default()
    }
}

/// Isolation and relay/output states (0x35B)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BmsStatus2 {
    pub isolation_adc: f64,
    pub ready_power: bool,
    pub charge_power: bool,
    pub discharge_relay: bool,
    pub charge_interlock: bool,
    pub mpo1: bool,
    pub mpo2: bool,
    pub mpo3: bool,
    pub mpo4: bool,
}

/// Drive unit electrical feedback (0x125)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DriveUnitFeedback {
    pub dc_current: f64,
    pub bus_voltage: f64,
    pub throttle_torque_request: f64,
    pub ac_current: f64,
}

/// Drive unit state (0x126)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DriveUnitStatus {
    pub op_mode: u8,
    pub gear: u8,
    pub mode: bool,
    pub drive_power_limited: bool,
    pub error: bool,
    pub brake_regen_light_request: bool,
    pub motor_speed: f64,
    pub inverter_temp: f64,
    pub motor_temp: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BusUpdates {
    pub bms_limits: Option<Timestamp>,
    pub bms_soc: Option<Timestamp>,
    pub bms_status1: Option<Timestamp>,
    pub bms_errors: Option<Timestamp>,
    pub bms_status2: Option<Timestamp>,
    pub du1_feedback: Option<Timestamp>,
    pub du1_status: Option<Timestamp>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageCounts {
    pub bms_limits: u64,
    pub bms_soc: u64,
    pub bms_status1: u64,
    pub bms_errors: u64,
    pub bms_status2: u64,
    pub du1_feedback: u64,
    pub du1_status: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusDocument {
    pub timestamp: Timestamp,
    pub bms_limits: BmsLimits,
    pub bms_soc: BmsSoc,
    pub bms_status1: BmsStatus1,
    pub bms_errors: BmsErrors,
    pub bms_status2: BmsStatus2,
    pub du1_feedback: DriveUnitFeedback,
    pub du1_status: DriveUnitStatus,
    pub last_update: BusUpdates,
    pub message_count: MessageCounts,
    #[serde(skip)]
    pub(crate) revision: u64,
}

impl BusDocument {
    pub fn new(created: Timestamp) -> Self {
        Self {
            timestamp: created,
            bms_limits: BmsLimits::default(),
            bms_soc: BmsSoc::default(),
            bms_status1: BmsStatus1::default(),
            bms_errors: BmsErrors::default(),
            bms_status2: BmsStatus2::default(),
            du1_feedback: DriveUnitFeedback::default(),
            du1_status: DriveUnitStatus::default(),
            last_update: BusUpdates::default(),
            message_count: MessageCounts::default(),
            revision: 0,
        }
    }

    /// Number of updates applied since creation
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub(crate) fn set_bms_limits(&mut self, limits: BmsLimits, at: Timestamp) {
        self.bms_limits = limits;
        self.last_update.bms_limits = Some(at);
        self.message_count.bms_limits += 1;
        self.touch(at);
    }

    pub(crate) fn set_bms_soc(&mut self, soc: BmsSoc, at: Timestamp) {
        self.bms_soc = soc;
        self.last_update.bms_soc = Some(at);
        self.message_count.bms_soc += 1;
        self.touch(at);
    }

    pub(crate) fn set_bms_status1(&mut self, status: BmsStatus1, at: Timestamp) {
        self.bms_status1 = status;
        self.last_update.bms_status1 = Some(at);
        self.message_count.bms_status1 += 1;
        self.touch(at);
    }

    pub(crate) fn set_bms_errors(&mut self, errors: BmsErrors, at: Timestamp) {
        self.bms_errors = errors;
        self.last_update.bms_errors = Some(at);
        self.message_count.bms_errors += 1;
        self.touch(at);
    }

    pub(crate) fn set_bms_status2(&mut self, status: BmsStatus2, at: Timestamp) {
        self.bms_status2 = status;
        self.last_update.bms_status2 = Some(at);
        self.message_count.bms_status2 += 1;
        self.touch(at);
    }

    pub(crate) fn set_du1_feedback(&mut self, feedback: DriveUnitFeedback, at: Timestamp) {
        self.du1_feedback = feedback;
        self.last_update.du1_feedback = Some(at);
        self.message_count.du1_feedback += 1;
        self.touch(at);
    }

    pub(crate) fn set_du1_status(&mut self, status: DriveUnitStatus, at: Timestamp) {
        self.du1_status = status;
        self.last_update.du1_status = Some(at);
        self.message_count.du1_status += 1;
        self.touch(at);
    }

    fn touch(&mut self, at: Timestamp) {
        self.timestamp = at;
        self.revision += 1;
    }
}

impl Default for BusDocument {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}
