//! TLV-TYPE numbers used by the bridge.
//!
//! Values follow the NDN packet format 0.3, NDNLPv2 and the NFD management
//! protocol.

// Packet types.
pub const INTEREST: u32 = 0x05;
pub const DATA: u32 = 0x06;
pub const LP_PACKET: u32 = 0x64;

// Name and components.
pub const NAME: u32 = 0x07;
pub const GENERIC_NAME_COMPONENT: u32 = 0x08;
pub const IMPLICIT_SHA256_DIGEST_COMPONENT: u32 = 0x01;
pub const PARAMETERS_SHA256_DIGEST_COMPONENT: u32 = 0x02;
pub const KEYWORD_NAME_COMPONENT: u32 = 0x20;
pub const SEGMENT_NAME_COMPONENT: u32 = 0x32;
pub const BYTE_OFFSET_NAME_COMPONENT: u32 = 0x34;
pub const VERSION_NAME_COMPONENT: u32 = 0x36;
pub const TIMESTAMP_NAME_COMPONENT: u32 = 0x38;
pub const SEQUENCE_NUM_NAME_COMPONENT: u32 = 0x3A;

// Interest.
pub const CAN_BE_PREFIX: u32 = 0x21;
pub const MUST_BE_FRESH: u32 = 0x12;
pub const FORWARDING_HINT: u32 = 0x1E;
pub const NONCE: u32 = 0x0A;
pub const INTEREST_LIFETIME: u32 = 0x0C;
pub const HOP_LIMIT: u32 = 0x22;
pub const APPLICATION_PARAMETERS: u32 = 0x24;
pub const INTEREST_SIGNATURE_INFO: u32 = 0x2C;
pub const INTEREST_SIGNATURE_VALUE: u32 = 0x2E;

// Data.
pub const META_INFO: u32 = 0x14;
pub const CONTENT: u32 = 0x15;
pub const SIGNATURE_INFO: u32 = 0x16;
pub const SIGNATURE_VALUE: u32 = 0x17;
pub const CONTENT_TYPE: u32 = 0x18;
pub const FRESHNESS_PERIOD: u32 = 0x19;
pub const FINAL_BLOCK_ID: u32 = 0x1A;
pub const SIGNATURE_TYPE: u32 = 0x1B;

// NDNLPv2.
pub const LP_FRAGMENT: u32 = 0x50;
pub const LP_SEQUENCE: u32 = 0x51;
pub const LP_FRAG_INDEX: u32 = 0x52;
pub const LP_FRAG_COUNT: u32 = 0x53;
pub const LP_PIT_TOKEN: u32 = 0x62;
pub const LP_NACK: u32 = 0x0320;
pub const LP_NEXT_HOP_FACE_ID: u32 = 0x0330;
pub const LP_INCOMING_FACE_ID: u32 = 0x0331;
pub const LP_CACHE_POLICY: u32 = 0x0334;
pub const LP_CONGESTION_MARK: u32 = 0x0340;
pub const LP_ACK: u32 = 0x0344;
pub const LP_TX_SEQUENCE: u32 = 0x0348;
pub const LP_NON_DISCOVERY: u32 = 0x034C;
pub const LP_PREFIX_ANNOUNCEMENT: u32 = 0x0350;

// NFD management.
pub const CONTROL_PARAMETERS: u32 = 0x68;
pub const CONTROL_RESPONSE: u32 = 0x65;
pub const STATUS_CODE: u32 = 0x66;
pub const STATUS_TEXT: u32 = 0x67;
pub const FACE_ID: u32 = 0x69;
pub const URI: u32 = 0x72;
pub const LOCAL_URI: u32 = 0x81;
pub const ORIGIN: u32 = 0x6F;
pub const COST: u32 = 0x6A;
pub const CAPACITY: u32 = 0x83;
pub const COUNT: u32 = 0x84;
pub const FLAGS: u32 = 0x6C;
pub const MASK: u32 = 0x70;
pub const STRATEGY: u32 = 0x6B;
pub const EXPIRATION_PERIOD: u32 = 0x6D;
pub const FACE_PERSISTENCY: u32 = 0x85;
pub const BASE_CONGESTION_MARKING_INTERVAL: u32 = 0x87;
pub const DEFAULT_CONGESTION_THRESHOLD: u32 = 0x88;
pub const MTU: u32 = 0x89;

// Face query filter and face events.
pub const FACE_QUERY_FILTER: u32 = 0x96;
pub const URI_SCHEME: u32 = 0x83;
pub const FACE_SCOPE: u32 = 0x84;
pub const LINK_TYPE: u32 = 0x86;
pub const FACE_EVENT_NOTIFICATION: u32 = 0xC0;
pub const FACE_EVENT_KIND: u32 = 0xC1;

// RIB dataset.
pub const RIB_ENTRY: u32 = 0x80;
pub const ROUTE: u32 = 0x81;
