use chrono::Utc;

use super::controller::UiEvent;

pub const USER_NAME_FIELD_ID: &str = "clientName";
pub const MESSAGE_FIELD_ID: &str = "clientMessage";
pub const SUBMIT_BUTTON_ID: &str = "submitMessage";
pub const FORM_CONTROL_CLASS: &str = "formControl";

/// Current values of the message form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormData {
    pub user_name: String,
    pub user_message: String,
}

impl FormData {
    pub fn new(user_name: impl Into<String>) -> Self {
        Self {
            user_name: user_name.into(),
            user_message: String::new(),
        }
    }
}

impl Default for FormData {
    fn default() -> Self {
        Self::new("Guest001")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputType {
    /// Reacts to `Change` input events
    Text,
    /// Reacts to `Click` input events
    Button,
}

/// Attributes a form field is created from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldConfig {
    pub id: String,
    pub css_class: String,
    pub input_type: InputType,
    pub initial_value: String,
    pub placeholder: Option<String>,
    pub disabled: bool,
}

impl FieldConfig {
    pub fn text(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn button(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            input_type: InputType::Button,
            initial_value: label.into(),
            ..Self::default()
        }
    }

    pub fn with_class(mut self, css_class: impl Into<String>) -> Self {
        self.css_class = css_class.into();
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.initial_value = value.into();
        self
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    pub fn with_disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            id: format!("field-{}", Utc::now().timestamp_millis()),
            css_class: String::new(),
            input_type: InputType::Text,
            initial_value: String::new(),
            placeholder: None,
            disabled: false,
        }
    }
}

/// What a field does when it receives the input event matching its type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldHandler {
    /// Emit the event; text fields pass their new value as payload
    Trigger(UiEvent),
    /// Only log the input
    Unhandled,
}

/// A rendered form control
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormField {
    config: FieldConfig,
    value: String,
    disabled: bool,
    handler: FieldHandler,
}

impl FormField {
    pub(crate) fn new(config: FieldConfig, handler: FieldHandler) -> Self {
        Self {
            value: config.initial_value.clone(),
            disabled: config.disabled,
            config,
            handler,
        }
    }

    pub fn id(&self) -> &str {
        &self.config.id
    }

    pub fn input_type(&self) -> InputType {
        self.config.input_type
    }

    pub fn placeholder(&self) -> Option<&str> {
        self.config.placeholder.as_deref()
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    pub fn handler(&self) -> FieldHandler {
        self.handler
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.config.css_class.split_whitespace().any(|c| c == class)
    }

    pub(crate) fn set_value(&mut self, value: impl Into<String>) {
        self.value = value.into();
    }

    pub(crate) fn set_disabled(&mut self, disabled: bool) {
        self.disabled = disabled;
    }
}

/// Input coming from whatever front-end drives the form
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    /// A text field's value was committed
    Change { field_id: String, value: String },
    /// A button was clicked
    Click { field_id: String },
    /// A key was released while the form had focus
    KeyUp { code: String },
}

impl InputEvent {
    pub fn change(field_id: impl Into<String>, value: impl Into<String>) -> Self {
        InputEvent::Change {
            field_id: field_id.into(),
            value: value.into(),
        }
    }

    pub fn click(field_id: impl Into<String>) -> Self {
        InputEvent::Click {
            field_id: field_id.into(),
        }
    }

    pub fn enter() -> Self {
        InputEvent::KeyUp {
            code: "Enter".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_starts_with_config_values() {
        let config = FieldConfig::text("clientName")
            .with_class("formControl wide")
            .with_value("Guest001")
            .with_placeholder("Your name...")
            .with_disabled(true);

        let field = FormField::new(config, FieldHandler::Unhandled);

        assert_eq!(field.id(), "clientName");
        assert_eq!(field.value(), "Guest001");
        assert_eq!(field.placeholder(), Some("Your name..."));
        assert!(field.is_disabled());
        assert!(field.has_class("formControl"));
        assert!(field.has_class("wide"));
        assert!(!field.has_class("form"));
    }

    #[test]
    fn test_button_config() {
        let config = FieldConfig::button("submitMessage", "Send");

        assert_eq!(config.input_type, InputType::Button);
        assert_eq!(config.initial_value, "Send");
        assert_eq!(config.placeholder, None);
    }

    #[test]
    fn test_default_config_gets_generated_id() {
        let config = FieldConfig::default();

        assert!(config.id.starts_with("field-"));
        assert_eq!(config.input_type, InputType::Text);
    }
}
