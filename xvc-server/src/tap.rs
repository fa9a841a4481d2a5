//! IEEE 1149.1 TAP controller state tracking.

use std::fmt::Display;

/// The 16 states of the standard TAP controller.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[repr(usize)]
pub enum TapState {
    TestLogicReset,
    RunTestIdle,

    SelectDrScan,
    CaptureDr,
    ShiftDr,
    Exit1Dr,
    PauseDr,
    Exit2Dr,
    UpdateDr,

    SelectIrScan,
    CaptureIr,
    ShiftIr,
    Exit1Ir,
    PauseIr,
    Exit2Ir,
    UpdateIr,
}

use TapState::*;

/// Next state per `[state][tms]`.
const NEXT_STATE: [[TapState; 2]; 16] = [
    /* TestLogicReset */ [RunTestIdle, TestLogicReset],
    /* RunTestIdle    */ [RunTestIdle, SelectDrScan],
    /* SelectDrScan   */ [CaptureDr, SelectIrScan],
    /* CaptureDr      */ [ShiftDr, Exit1Dr],
    /* ShiftDr        */ [ShiftDr, Exit1Dr],
    /* Exit1Dr        */ [PauseDr, UpdateDr],
    /* PauseDr        */ [PauseDr, Exit2Dr],
    /* Exit2Dr        */ [ShiftDr, UpdateDr],
    /* UpdateDr       */ [RunTestIdle, SelectDrScan],
    /* SelectIrScan   */ [CaptureIr, TestLogicReset],
    /* CaptureIr      */ [ShiftIr, Exit1Ir],
    /* ShiftIr        */ [ShiftIr, Exit1Ir],
    /* Exit1Ir        */ [PauseIr, UpdateIr],
    /* PauseIr        */ [PauseIr, Exit2Ir],
    /* Exit2Ir        */ [ShiftIr, UpdateIr],
    /* UpdateIr       */ [RunTestIdle, SelectDrScan],
];

impl TapState {
    /// All states, in table order.
    pub const ALL: [TapState; 16] = [
        TestLogicReset,
        RunTestIdle,
        SelectDrScan,
        CaptureDr,
        ShiftDr,
        Exit1Dr,
        PauseDr,
        Exit2Dr,
        UpdateDr,
        SelectIrScan,
        CaptureIr,
        ShiftIr,
        Exit1Ir,
        PauseIr,
        Exit2Ir,
        UpdateIr,
    ];

    /// The state reached from `self` after one TCK cycle with the given TMS
    /// value.
    pub fn step(self, tms: bool) -> TapState {
        NEXT_STATE[self as usize][tms as usize]
    }
}

impl Display for TapState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TestLogicReset => "RESET",
            RunTestIdle => "IDLE",
            SelectDrScan => "DRSELECT",
            CaptureDr => "DRCAPTURE",
            ShiftDr => "DRSHIFT",
            Exit1Dr => "DREXIT1",
            PauseDr => "DRPAUSE",
            Exit2Dr => "DREXIT2",
            UpdateDr => "DRUPDATE",
            SelectIrScan => "IRSELECT",
            CaptureIr => "IRCAPTURE",
            ShiftIr => "IRSHIFT",
            Exit1Ir => "IREXIT1",
            PauseIr => "IRPAUSE",
            Exit2Ir => "IREXIT2",
            UpdateIr => "IRUPDATE",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod test {
    use super::TapState;
    use super::TapState::*;

    #[test]
    fn five_tms_high_resets_from_any_state() {
        for start in TapState::ALL {
            let mut state = start;
            for _ in 0..5 {
                state = state.step(true);
            }
            assert_eq!(state, TestLogicReset, "starting from {}", start);
        }
    }

    #[test]
    fn dr_scan_walk() {
        let mut state = TestLogicReset;
        for tms in [false, true, false, false] {
            state = state.step(tms);
        }
        assert_eq!(state, ShiftDr);
        // shifting holds the state
        assert_eq!(state.step(false), ShiftDr);
        // exit and update back to idle
        assert_eq!(state.step(true).step(true).step(false), RunTestIdle);
    }

    #[test]
    fn ir_scan_walk() {
        let mut state = RunTestIdle;
        for tms in [true, true, false, false] {
            state = state.step(tms);
        }
        assert_eq!(state, ShiftIr);
        assert_eq!(state.step(true), Exit1Ir);
        assert_eq!(Exit1Ir.step(false), PauseIr);
        assert_eq!(PauseIr.step(true), Exit2Ir);
        assert_eq!(Exit2Ir.step(false), ShiftIr);
    }

    #[test]
    fn display_names() {
        assert_eq!(TestLogicReset.to_string(), "RESET");
        assert_eq!(RunTestIdle.to_string(), "IDLE");
        assert_eq!(CaptureDr.to_string(), "DRCAPTURE");
        assert_eq!(Exit1Ir.to_string(), "IREXIT1");
    }
}
