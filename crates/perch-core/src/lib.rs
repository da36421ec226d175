//! # Perch Core
//!
//! Foundation types for the Perch chat bot runtime.
//!
//! - **Events** ([`Event`], [`MessageEvent`]): what the platform delivers.
//! - **Messages** ([`Msg`], [`MessageEnvelope`], [`SelfIdentity`], [`UserInfo`]):
//!   who said what, and whether it was said to us.
//! - **Answers** ([`Answer`], [`OutgoingMessage`], [`ReplyRecord`]): what we say
//!   back and what we remember about it.
//! - **Collaborators** ([`ChatDriver`], [`UserInfoFinder`], [`SelfInfoFinder`]):
//!   the platform-facing traits a transport implements.
//!
//! ```text
//! ┌──────────────┐  Event   ┌────────────┐  OutgoingMessage  ┌────────────┐
//! │ Event source │─────────▶│  Runtime   │──────────────────▶│ ChatDriver │
//! └──────────────┘          └────────────┘◀──────────────────└────────────┘
//!                                           MessageReceipt
//! ```

pub mod answer;
pub mod driver;
pub mod error;
pub mod event;
pub mod message;

pub use answer::{Answer, AnswerOptions, MessageReceipt, OutgoingMessage, ReplyRecord, ThreadTarget};
pub use driver::{
    BoxedChatDriver, BoxedSelfInfoFinder, BoxedUserInfoFinder, ChatDriver, SelfInfoFinder,
    UserInfoFinder,
};
pub use error::{ApiError, ApiResult};
pub use event::{Event, MessageEvent, MessageSubtype};
pub use message::{Msg, MessageEnvelope, SelfIdentity, Timestamp, UserInfo, is_direct_channel};
