// Public API - what other modules can use
pub use controller::{UiController, UiError, UiEvent, UiMetadata};
pub use form::{
    FieldConfig, FieldHandler, FormData, FormField, InputEvent, InputType, FORM_CONTROL_CLASS,
    MESSAGE_FIELD_ID, SUBMIT_BUTTON_ID, USER_NAME_FIELD_ID,
};
pub use message::{Direction, MessageView};
pub use render::{Renderer, TerminalRenderer};

// Internal modules
mod controller;
mod form;
mod message;
mod render;
