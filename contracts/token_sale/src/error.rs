use soroban_sdk::contracterror;

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum Error {
    // ============================================
    // INITIALIZATION ERRORS (1-9)
    // ============================================
    /// Contract already initialized
    AlreadyInitialized = 1,
    /// Contract not initialized
    NotInitialized = 2,
    /// Variant terms are inconsistent (zero periods, zero price, ...)
    InvalidConfig = 3,
    /// Refund period outside [MIN_REFUND_PERIOD, MAX_REFUND_PERIOD]
    InvalidRefundPeriod = 4,
    /// Fee above MAX_FEE_BPS
    InvalidFee = 5,
    /// Start time lies in the past
    InvalidStartTime = 6,
    /// Vesting terms rejected
    InvalidVestingConfig = 7,

    // ============================================
    // AUTHORIZATION ERRORS (10-19)
    // ============================================
    /// Caller holds neither of the roles allowed here
    Unauthorized = 10,

    // ============================================
    // PHASE ERRORS (20-39)
    // ============================================
    /// Sale start time not reached
    SaleNotStarted = 20,
    /// Between the prefund window and the sale window (fixed price)
    PrefundAllocationPeriodNotEnded = 21,
    /// Sale no longer accepts this action
    SaleHasEnded = 22,
    /// Sale still active
    SaleHasNotEnded = 23,
    /// Sale was canceled
    SaleIsCanceled = 24,
    /// Action only available after cancellation
    SaleIsNotCanceled = 25,
    /// Result publication started, cancellation is locked
    SaleCancelLocked = 26,
    /// Refund window closed
    RefundPeriodIsOver = 27,
    /// Refund window still open
    RefundPeriodIsNotOver = 28,
    /// Sale results not published
    ResultsNotPublished = 29,
    /// Capital raised not published
    CapitalNotRaised = 30,
    /// Project has not supplied the allocated tokens
    TokensNotSupplied = 31,
    /// Contract is paused
    ContractPaused = 32,
    /// Operation not available for this sale variant
    InvalidSaleVariant = 33,

    // ============================================
    // INTEGRITY ERRORS (40-59)
    // ============================================
    /// Eligibility signature not produced by the configured signer
    InvalidSignature = 40,
    /// Claim proof does not match the claim root
    InvalidClaimProof = 41,
    /// Accepted-capital proof does not match the accepted root
    InvalidAcceptedCapitalProof = 42,
    /// Public key is the identity, off the subgroup, flagged or invalidated
    InvalidBidPublicKey = 43,
    /// Private key does not reproduce the sale public key
    InvalidBidPrivateKey = 44,
    /// Sealed bid missing (auction) or unexpected (other variants)
    InvalidSealedBid = 45,
    /// Bid salt not bound to the investor
    InvalidSalt = 46,
    /// Decryption key not published yet
    PrivateKeyNotPublished = 47,
    /// Decryption key already published
    PrivateKeyAlreadyPublished = 48,
    /// Public key can no longer change, bids are sealed under it
    BidsAlreadySealed = 49,
    /// Token amount inconsistent with the published allocation
    InvalidTokenAmount = 50,
    /// Ask token is the capital token
    InvalidAskToken = 51,

    // ============================================
    // DOUBLE-ACTION ERRORS (60-69)
    // ============================================
    /// Sale results already published
    ResultsAlreadyPublished = 60,
    /// Capital raised already published
    CapitalRaisedAlreadyPublished = 61,
    /// Allocation already claimed
    AlreadyClaimed = 62,
    /// Position already refunded
    AlreadyRefunded = 63,
    /// Withdrawal already performed
    AlreadyWithdrawn = 64,
    /// Raised capital withdrawn, sale is final
    CapitalAlreadyWithdrawn = 65,
    /// Allocated tokens already supplied
    TokensAlreadySupplied = 66,
    /// Investors started claiming, sale can no longer be canceled
    AllocationsAlreadyClaimed = 67,

    // ============================================
    // AMOUNT ERRORS (70-79)
    // ============================================
    /// Amount must be positive
    InvalidAmount = 70,
    /// Investor has no capital in the sale
    NoCapitalInvested = 71,
    /// Accepted capital covers the whole investment
    NoExcessCapital = 72,
    /// Custody holds less capital than the audited raise
    InsufficientCapital = 73,
    /// Checked arithmetic overflowed
    ArithmeticOverflow = 74,
}
