//! # System Constants
//!
//! Action identifiers, peer command names, queue names and timeout defaults
//! that define the wire contract between the project service and its peers.
//!
//! Action identifiers are what the controller layer sends in; command names
//! are what goes out on the message bus. Handler tables map one onto the other.

/// Inbound action identifiers, grouped the way the handler tables are
pub mod actions {
    // Project settings
    pub const SETTINGS_LIST: &str = "SETTINGS.LIST";
    pub const SETTINGS_GET: &str = "SETTINGS.GET";

    // Regional (EL) project variant
    pub const REDEEM_VOUCHER: &str = "ELPROJECT.REDEEM_VOUCHER";
    pub const PROCESS_OTP: &str = "ELPROJECT.PROCESS_OTP";
    pub const ASSIGN_DISCOUNT_VOUCHER: &str = "ELPROJECT.ASSIGN_DISCOUNT_VOUCHER";
    pub const REQUEST_REDEMPTION: &str = "ELPROJECT.REQUEST_REDEMPTION";
    pub const UPDATE_REDEMPTION: &str = "ELPROJECT.UPDATE_REDEMPTION";
    pub const LIST_REDEMPTION: &str = "ELPROJECT.LIST_REDEMPTION";
    pub const GET_VENDOR_REDEMPTION: &str = "ELPROJECT.GET_VENDOR_REDEMPTION";
    pub const GET_VENDOR_REFERRER: &str = "ELPROJECT.GET_VENDOR_REFERRER";

    // Beneficiary
    pub const BENEFICIARY_ADD_TO_PROJECT: &str = "BENEFICIARY.ADD_TO_PROJECT";
    pub const BENEFICIARY_ASSIGN_TO_PROJECT: &str = "BENEFICIARY.ASSIGN_TO_PROJECT";
    pub const BENEFICIARY_BULK_ASSIGN_TO_PROJECT: &str = "BENEFICIARY.BULK_ASSIGN_TO_PROJECT";
    pub const BENEFICIARY_BULK_REFER_TO_PROJECT: &str = "BENEFICIARY.BULK_REFER_TO_PROJECT";
    pub const BENEFICIARY_LIST_BY_PROJECT: &str = "BENEFICIARY.LIST_BY_PROJECT";

    // Vendor
    pub const VENDOR_ASSIGN_TO_PROJECT: &str = "VENDOR.ASSIGN_TO_PROJECT";
    pub const VENDOR_LIST_BY_PROJECT: &str = "VENDOR.LIST_BY_PROJECT";

    /// Actions settled through the meta-transaction queue instead of a peer RPC
    pub const META_TRANSACTION_ACTIONS: &[&str] = &[
        REDEEM_VOUCHER,
        PROCESS_OTP,
        ASSIGN_DISCOUNT_VOUCHER,
        REQUEST_REDEMPTION,
    ];
}

/// Outbound command names understood by peer microservices
pub mod commands {
    pub const PROJECT_SETTINGS_LIST: &str = "PROJECT_SETTINGS_LIST";
    pub const PROJECT_SETTINGS_GET: &str = "PROJECT_SETTINGS_GET";

    pub const REDEEM_VOUCHER: &str = "REDEEM_VOUCHER";
    pub const PROCESS_OTP: &str = "PROCESS_OTP";
    pub const ASSIGN_DISCOUNT_VOUCHER: &str = "ASSIGN_DISCOUNT_VOUCHER";
    pub const REQUEST_REDEMPTION: &str = "REQUEST_REDEMPTION";
    pub const UPDATE_REDEMPTION: &str = "UPDATE_REDEMPTION";
    pub const LIST_REDEMPTION: &str = "LIST_REDEMPTION";
    pub const GET_VENDOR_REDEMPTION: &str = "GET_VENDOR_REDEMPTION";

    pub const BENEFICIARY_ADD_TO_PROJECT: &str = "BENEFICIARY_ADD_TO_PROJECT";
    pub const BENEFICIARY_ASSIGN_TO_PROJECT: &str = "BENEFICIARY_ASSIGN_TO_PROJECT";
    pub const BENEFICIARY_BULK_ASSIGN_TO_PROJECT: &str = "BENEFICIARY_BULK_ASSIGN_TO_PROJECT";
    pub const BENEFICIARY_BULK_REFER_TO_PROJECT: &str = "BENEFICIARY_BULK_REFER_TO_PROJECT";
    pub const BENEFICIARY_LIST_BY_PROJECT: &str = "BENEFICIARY_LIST_BY_PROJECT";
    pub const BENEFICIARY_VENDOR_REFERRAL: &str = "BENEFICIARY_VENDOR_REFERRAL";

    pub const VENDOR_ASSIGN_PROJECT: &str = "VENDOR_ASSIGN_PROJECT";
    pub const VENDOR_LIST_BY_PROJECT: &str = "VENDOR_LIST_BY_PROJECT";
}

/// Meta-transaction queue contract
pub mod queues {
    pub const META_TXN_QUEUE: &str = "META_TXN";
    pub const ADD_QUEUE_JOB: &str = "ADD_QUEUE";
}

/// Timeouts applied to peer RPC calls, in milliseconds
pub mod timeouts {
    pub const DEFAULT_COMMAND_TIMEOUT_MS: u64 = 5_000;
    /// Redemption flows touch the chain and the vendor ledger; they run long.
    pub const REDEMPTION_TIMEOUT_MS: u64 = 500_000;
    pub const VENDOR_REFERRER_TIMEOUT_MS: u64 = 50_000;
}

/// Payload and response field names inspected by the notification rules
pub mod fields {
    pub const DTO: &str = "dto";
    pub const TYPE: &str = "type";
    pub const INSERTED_DATA: &str = "insertedData";
    pub const WALLET_ADDRESS: &str = "walletAddress";
    pub const VENDOR_DATA: &str = "vendordata";
    pub const ID: &str = "id";
    pub const PROJECT_ID: &str = "projectId";
    pub const PROJECT_UID: &str = "projectUid";
    pub const SUBJECT_ID: &str = "subjectId";
    pub const USER: &str = "user";
    pub const CMD: &str = "cmd";
}

pub const BENEFICIARY_TYPE_REFERRED: &str = "REFERRED";
pub const INVALID_ACTION_MESSAGE: &str = "Please provide a valid action!";

pub mod system {
    pub const RAHAT_CORE_VERSION: &str = env!("CARGO_PKG_VERSION");
    pub const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 1000;
}
