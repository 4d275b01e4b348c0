/// Application name
pub const APP_NAME: &str = "Ethica";

/// Display names of the ten review pipeline stages, indexed by `sequence - 1`.
pub const PIPELINE_STAGES: [&str; PIPELINE_LENGTH as usize] = [
    "Submission of Requirements",
    "Assignment of Protocol Code",
    "Initial Review",
    "Assignment of Review Type",
    "Decision Letter",
    "Payment",
    "Panel and Meeting Schedule",
    "Review Results",
    "Additional Requirements",
    "Ethics Clearance",
];

/// Number of stages in the review pipeline
pub const PIPELINE_LENGTH: u8 = 10;

/// Conventional status lifecycle values (the field itself is free text)
pub const STATE_PENDING: &str = "Pending";
pub const STATE_IN_PROGRESS: &str = "In Progress";
pub const STATE_DONE: &str = "Done";
pub const STATE_APPROVED: &str = "Approved";
pub const STATE_SIGNED: &str = "Signed";
pub const STATE_COMPLETED: &str = "Completed";
pub const STATE_REMOVED: &str = "Removed";

/// Push topic prefix for a single application (`application.{id}`)
pub const TOPIC_APPLICATION_PREFIX: &str = "application.";

/// Push topic carrying newly created applications
pub const TOPIC_APPLICATION_LIST: &str = "application-list";

/// Push event names
pub const EVENT_APPLICATION_UPDATED: &str = "ApplicationUpdated";
pub const EVENT_SEND_AND_UPDATE_FEEDBACK: &str = "SendAndUpdateFeedback";
pub const EVENT_APPLICATION_CREATED: &str = "ApplicationCreated";

/// Wire markers for message delivery state
pub const DELIVERY_SENDING: &str = "sending...";
pub const DELIVERY_SENT: &str = "sent";
pub const DELIVERY_FAILED: &str = "failed";

/// Suffix of the generated notice when a push event carries no message
pub const DEFAULT_UPDATE_NOTICE: &str = "has a new update";

/// Default base URL of the tracker HTTP API
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";

/// Default number of applications per list page
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Default lifetime of a transient notice in seconds
pub const DEFAULT_NOTICE_TTL_SECS: u64 = 5;

/// Default capacity of the push event channel
pub const DEFAULT_PUSH_BUFFER: usize = 64;
