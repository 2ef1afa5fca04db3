use std::cell::{Cell, RefCell};
use strum::IntoEnumIterator;
use strum_macros::{AsRefStr, Display, EnumIter};
use thiserror::Error;
use tracing::{debug, info};

use super::{
    form::{
        FieldConfig, FieldHandler, FormData, FormField, InputEvent, InputType,
        FORM_CONTROL_CLASS, MESSAGE_FIELD_ID, SUBMIT_BUTTON_ID, USER_NAME_FIELD_ID,
    },
    message::{Direction, MessageView},
    render::Renderer,
};
use crate::event::{EventError, EventRegistry, Listener, ListenerError};

/// Events emitted by the [`UiController`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr, Display, EnumIter)]
#[strum(serialize_all = "camelCase")]
pub enum UiEvent {
    /// The name field changed; payload is the new name
    UserNameChanged,
    /// The message field changed; payload is the typed message
    MessageChanged,
    /// The send button was clicked or Enter was pressed; no payload
    FormSubmitted,
}

#[derive(Debug, Error)]
pub enum UiError {
    #[error("Unknown form field: {0}")]
    UnknownField(String),

    #[error("Render error: {0}")]
    Render(#[from] std::io::Error),

    #[error(transparent)]
    Event(#[from] EventError),
}

/// Where the UI renders and whether the form starts disabled
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiMetadata {
    pub form_placeholder_id: String,
    pub message_placeholder_id: String,
    pub form_disabled: bool,
}

impl Default for UiMetadata {
    fn default() -> Self {
        Self {
            form_placeholder_id: "form".to_string(),
            message_placeholder_id: "messagePlaceholder".to_string(),
            form_disabled: true,
        }
    }
}

/// Headless model of the chat form and message list
///
/// Input events are routed to the fields they target and turned into
/// [`UiEvent`]s; drawing is delegated to a [`Renderer`].
pub struct UiController {
    events: EventRegistry<String>,
    metadata: RefCell<UiMetadata>,
    fields: RefCell<Vec<FormField>>,
    messages: RefCell<Vec<MessageView>>,
    submit_on_enter: Cell<bool>,
    renderer: Box<dyn Renderer>,
}

impl UiController {
    pub fn new(renderer: Box<dyn Renderer>) -> Result<Self, UiError> {
        let events = EventRegistry::new("UiController", UiEvent::iter().map(|e| e.to_string()))?;

        Ok(Self {
            events,
            metadata: RefCell::new(UiMetadata::default()),
            fields: RefCell::new(Vec::new()),
            messages: RefCell::new(Vec::new()),
            submit_on_enter: Cell::new(false),
            renderer,
        })
    }

    pub fn init(&self, metadata: UiMetadata) {
        debug!(
            form = %metadata.form_placeholder_id,
            messages = %metadata.message_placeholder_id,
            disabled = metadata.form_disabled,
            "UI initialised"
        );
        *self.metadata.borrow_mut() = metadata;
    }

    pub fn events(&self) -> &EventRegistry<String> {
        &self.events
    }

    pub fn on_user_name_changed<F>(&self, callback: F) -> Result<Listener<String>, EventError>
    where
        F: Fn(&str) -> Result<(), ListenerError> + 'static,
    {
        self.events.on(UiEvent::UserNameChanged.as_ref(), move |name| {
            callback(name.map(String::as_str).unwrap_or_default())
        })
    }

    pub fn on_message_changed<F>(&self, callback: F) -> Result<Listener<String>, EventError>
    where
        F: Fn(&str) -> Result<(), ListenerError> + 'static,
    {
        self.events.on(UiEvent::MessageChanged.as_ref(), move |message| {
            callback(message.map(String::as_str).unwrap_or_default())
        })
    }

    pub fn on_form_submitted<F>(&self, callback: F) -> Result<Listener<String>, EventError>
    where
        F: Fn() -> Result<(), ListenerError> + 'static,
    {
        self.events
            .on(UiEvent::FormSubmitted.as_ref(), move |_| callback())
    }

    pub fn off(&self, event: UiEvent, listener: &Listener<String>) -> Result<bool, EventError> {
        self.events.unsubscribe(event.as_ref(), listener)
    }

    /// Builds the name, message and send controls and renders them into the form placeholder
    pub fn render_message_form(&self, data: &FormData) -> Result<(), UiError> {
        let disabled = self.metadata.borrow().form_disabled;

        let user_field = FieldConfig::text(USER_NAME_FIELD_ID)
            .with_class(FORM_CONTROL_CLASS)
            .with_value(data.user_name.clone())
            .with_placeholder("Your name...")
            .with_disabled(disabled);

        let message_field = FieldConfig::text(MESSAGE_FIELD_ID)
            .with_class(FORM_CONTROL_CLASS)
            .with_value(data.user_message.clone())
            .with_placeholder("Type your message here...")
            .with_disabled(disabled);

        let submit_button = FieldConfig::button(SUBMIT_BUTTON_ID, "Send")
            .with_class(FORM_CONTROL_CLASS)
            .with_disabled(disabled);

        let fields = [
            self.create_form_field(user_field, Some(UiEvent::UserNameChanged)),
            self.create_form_field(message_field, Some(UiEvent::MessageChanged)),
            self.create_form_field(submit_button, Some(UiEvent::FormSubmitted)),
        ];

        let target_id = self.metadata.borrow().form_placeholder_id.clone();
        for field in fields {
            self.render_field(&target_id, field)?;
        }

        self.submit_on_enter.set(true);
        Ok(())
    }

    /// Creates a field; without an event to trigger it only logs its input
    pub fn create_form_field(&self, config: FieldConfig, trigger: Option<UiEvent>) -> FormField {
        let handler = match trigger {
            Some(event) => FieldHandler::Trigger(event),
            None => FieldHandler::Unhandled,
        };
        FormField::new(config, handler)
    }

    /// Appends `field` to the form and hands it to the renderer
    pub fn render_field(&self, target_id: &str, field: FormField) -> Result<(), UiError> {
        self.renderer.render_field(target_id, &field)?;
        self.fields.borrow_mut().push(field);
        Ok(())
    }

    /// Routes a front-end input event to the form
    pub fn handle_input(&self, input: InputEvent) -> Result<(), UiError> {
        match input {
            InputEvent::Change { field_id, value } => {
                let handler = {
                    let mut fields = self.fields.borrow_mut();
                    let field = find_field_mut(&mut fields, &field_id)?;
                    if field.is_disabled() || field.input_type() != InputType::Text {
                        debug!(field = %field_id, "Change ignored");
                        return Ok(());
                    }
                    field.set_value(value.clone());
                    field.handler()
                };
                self.run_handler(&field_id, handler, Some(value))
            }
            InputEvent::Click { field_id } => {
                let handler = {
                    let fields = self.fields.borrow();
                    let field = fields
                        .iter()
                        .find(|field| field.id() == field_id)
                        .ok_or_else(|| UiError::UnknownField(field_id.clone()))?;
                    if field.is_disabled() || field.input_type() != InputType::Button {
                        debug!(field = %field_id, "Click ignored");
                        return Ok(());
                    }
                    field.handler()
                };
                self.run_handler(&field_id, handler, None)
            }
            InputEvent::KeyUp { code } => {
                if code == "Enter" && self.submit_on_enter.get() && !self.is_form_disabled() {
                    self.events.emit(UiEvent::FormSubmitted.as_ref(), None)?;
                }
                Ok(())
            }
        }
    }

    /// Displays a message in the message list
    ///
    /// `sender` is empty for messages sent by the local user.
    pub fn display_message(&self, text: &str, received: bool, sender: &str) -> Result<(), UiError> {
        let direction = if received {
            Direction::Received
        } else {
            Direction::Sent
        };
        let message = MessageView::new(text, sender, direction);

        let target_id = self.metadata.borrow().message_placeholder_id.clone();
        self.renderer.render_message(&target_id, &message)?;
        self.messages.borrow_mut().push(message);
        Ok(())
    }

    /// Disables (`true`) or enables (`false`) every form control
    pub fn set_form_disabled(&self, disabled: bool) -> Result<(), UiError> {
        {
            let mut metadata = self.metadata.borrow_mut();
            if metadata.form_disabled == disabled {
                return Ok(());
            }
            metadata.form_disabled = disabled;
        }

        for field in self.fields.borrow_mut().iter_mut() {
            if field.has_class(FORM_CONTROL_CLASS) {
                field.set_disabled(disabled);
            }
        }

        info!(disabled = disabled, "Form disable mode changed");
        self.renderer.form_disabled_changed(disabled)?;
        Ok(())
    }

    /// Puts `data` back into the name and message fields
    pub fn reset_form(&self, data: &FormData) -> Result<(), UiError> {
        let mut fields = self.fields.borrow_mut();
        find_field_mut(&mut fields, USER_NAME_FIELD_ID)?.set_value(data.user_name.clone());
        find_field_mut(&mut fields, MESSAGE_FIELD_ID)?.set_value(data.user_message.clone());
        Ok(())
    }

    pub fn is_form_disabled(&self) -> bool {
        self.metadata.borrow().form_disabled
    }

    pub fn field_value(&self, field_id: &str) -> Option<String> {
        self.fields
            .borrow()
            .iter()
            .find(|field| field.id() == field_id)
            .map(|field| field.value().to_string())
    }

    pub fn fields(&self) -> Vec<FormField> {
        self.fields.borrow().clone()
    }

    pub fn messages(&self) -> Vec<MessageView> {
        self.messages.borrow().clone()
    }

    fn run_handler(
        &self,
        field_id: &str,
        handler: FieldHandler,
        payload: Option<String>,
    ) -> Result<(), UiError> {
        match handler {
            FieldHandler::Trigger(event) => {
                self.events.emit(event.as_ref(), payload.as_ref())?;
            }
            FieldHandler::Unhandled => {
                info!(field = %field_id, "Intercepted unhandled UI event");
            }
        }
        Ok(())
    }
}

fn find_field_mut<'a>(
    fields: &'a mut [FormField],
    field_id: &str,
) -> Result<&'a mut FormField, UiError> {
    fields
        .iter_mut()
        .find(|field| field.id() == field_id)
        .ok_or_else(|| UiError::UnknownField(field_id.to_string()))
}
