//! # TUI Components
//!
//! Everything drawn on the chat screen.
//!
//! ## Component Architecture
//!
//! ### Stateless Components (Props-Based Rendering)
//!
//! Built each frame from borrowed data:
//! - `Header`: product name, tagline, backend and status
//! - `MessageBubble`: one user question or agent answer
//! - `TypingIndicator`: "AI is thinking" under the last bubble
//!
//! ### Stateful Components (Event-Driven)
//!
//! Persistent state lives in `TuiState`; the component wraps it per frame:
//! - `InputBox`: the message field
//! - `MessageList` / `MessageListState`: scrolling, selection, layout cache
//! - `HowItWorks` / `HowItWorksState`: the F1 drawer
//!
//! ## Module Structure
//!
//! ```text
//! components/
//! ├── mod.rs              (this file)
//! ├── header.rs           (top bar)
//! ├── message.rs          (single bubble, sources disclosure, copy state)
//! ├── message_list.rs     (scrollable bubble container)
//! ├── typing_indicator.rs (loading row)
//! ├── input_box.rs        (message field)
//! └── how_it_works.rs     (help drawer)
//! ```

pub mod header;
pub mod how_it_works;
pub mod input_box;
pub mod message;
pub mod message_list;
pub mod typing_indicator;

pub use header::Header;
pub use how_it_works::{DrawerEvent, HowItWorks, HowItWorksState};
pub use input_box::{InputBox, InputEvent};
pub use message::MessageBubble;
pub use message_list::{MessageList, MessageListState};
pub use typing_indicator::TypingIndicator;
