//! # TUI Components
//!
//! This module contains all UI components for the terminal interface.
//!
//! ## Component Architecture
//!
//! ### Stateless Components (Props-Based Rendering)
//!
//! Simple display components that receive all data as parameters:
//! - `TitleBar`: model, creativity, retry budget and status
//! - `Message`: one conversation message
//! - `LandingPage`: welcome panel shown before the first question
//!
//! ### Stateful Components (Event-Driven)
//!
//! Components that manage local state and emit events:
//! - `InputBox`: question editor
//! - `MessageList`: scrollable conversation view
//! - `ModelPicker`: model switching overlay
//!
//! ## Props-Based Data Flow
//!
//! Components receive external data as "props", not by reaching into global
//! state:
//!
//! ```rust,ignore
//! // Dependencies are explicit
//! TitleBar::from_app(&app, has_unseen).render(frame, area);
//! ```
//!
//! ## Module Structure
//!
//! ```text
//! components/
//! ├── mod.rs           (this file)
//! ├── title_bar.rs     (Top status bar)
//! ├── landing.rs       (Welcome panel)
//! ├── message.rs       (Single message renderer)
//! ├── message_list.rs  (Scrollable message container)
//! ├── input_box.rs     (Question editor)
//! └── model_picker.rs  (Model overlay)
//! ```

mod title_bar;
pub use title_bar::TitleBar;

pub mod input_box;
pub mod landing;
pub mod message;
pub mod message_list;
pub mod model_picker;

pub use input_box::{InputBox, InputEvent};
pub use landing::LandingPage;
pub use message_list::{MessageList, MessageListState};
pub use model_picker::{ModelPicker, ModelPickerEvent, ModelPickerState};
