use soroban_sdk::contracterror;

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum Error {
    // ============================================
    // CONFIGURATION ERRORS (1-9)
    // ============================================
    /// Strategy unknown, cliff longer than duration or epochs not dividing duration
    InvalidVestingConfig = 1,

    // ============================================
    // SCHEDULE ERRORS (10-19)
    // ============================================
    /// No schedule stored under this id
    ScheduleNotFound = 10,
    /// Schedule already received its tokens
    ScheduleAlreadyFunded = 11,
    /// Schedule has not received its tokens yet
    ScheduleNotFunded = 12,

    // ============================================
    // RELEASE ERRORS (20-29)
    // ============================================
    /// Cliff has not elapsed yet
    CliffNotEnded = 20,

    // ============================================
    // AMOUNT ERRORS (30-39)
    // ============================================
    /// Amount must be positive
    InvalidAmount = 30,
    /// Manager does not hold enough unaccounted tokens for this funding
    InsufficientDeposit = 31,
    /// Vesting arithmetic overflowed
    ArithmeticOverflow = 32,
}
