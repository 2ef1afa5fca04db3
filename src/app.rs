use std::cell::RefCell;
use std::rc::Rc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, info};

use crate::config::ClientConfig;
use crate::connection::{self, ConnectionController, Transport};
use crate::shared::AppError;
use crate::ui::{
    FormData, InputEvent, Renderer, UiController, UiMetadata, MESSAGE_FIELD_ID, USER_NAME_FIELD_ID,
};

/// The chat client: UI and connection controllers wired together
///
/// Built once by [`ChatApp::assemble`]; listeners only hold weak references
/// to the controllers, so dropping the app drops everything.
pub struct ChatApp {
    ui: Rc<UiController>,
    connection: Rc<ConnectionController>,
    form_data: Rc<RefCell<FormData>>,
}

impl ChatApp {
    /// Creates the controllers, attaches all listeners and renders the form
    pub fn assemble(config: &ClientConfig, renderer: Box<dyn Renderer>) -> Result<Self, AppError> {
        let app = Self {
            ui: Rc::new(UiController::new(renderer)?),
            connection: Rc::new(ConnectionController::new(config.url.clone())?),
            form_data: Rc::new(RefCell::new(FormData::new(config.name.clone()))),
        };

        app.attach_ui_listeners()?;

        app.ui.init(UiMetadata::default());
        app.ui.render_message_form(&app.form_data.borrow())?;

        app.attach_connection_listeners()?;

        info!(url = %config.url, name = %config.name, "Chat app assembled");
        Ok(app)
    }

    pub fn ui(&self) -> &UiController {
        &self.ui
    }

    pub fn connection(&self) -> &ConnectionController {
        &self.connection
    }

    pub fn form_data(&self) -> FormData {
        self.form_data.borrow().clone()
    }

    /// Connects to the relay and chats from `input` until either side closes
    pub async fn run<R>(&self, input: R) -> Result<(), AppError>
    where
        R: AsyncBufRead + Unpin,
    {
        let socket = connection::connect(self.connection.url())
            .await
            .map_err(connection::ConnectionError::from)?;
        self.run_with(socket, input).await
    }

    /// Same as [`run`](Self::run) over an already opened transport
    pub async fn run_with<T, R>(&self, transport: T, input: R) -> Result<(), AppError>
    where
        T: Transport,
        R: AsyncBufRead + Unpin,
    {
        let session = self.connection.run(transport);
        tokio::pin!(session);

        let mut lines = input.lines();
        let mut input_open = true;

        loop {
            tokio::select! {
                // Socket events go first so a line is only handled once the
                // connection state it depends on is up to date
                biased;

                result = &mut session => {
                    result?;
                    break;
                }

                line = lines.next_line(), if input_open => {
                    match line? {
                        Some(line) => {
                            if !self.handle_line(&line)? {
                                // Let the session flush what was already sent
                                self.connection.disconnect();
                                input_open = false;
                            }
                        }
                        None => input_open = false,
                    }
                }
            }
        }

        Ok(())
    }

    /// Turns one terminal line into form input
    ///
    /// `/name <name>` changes the display name, `/quit` stops the client,
    /// anything else is typed into the message field and submitted with Enter.
    /// Returns `false` when the client should stop.
    pub fn handle_line(&self, line: &str) -> Result<bool, AppError> {
        let line = line.trim();

        if line == "/quit" {
            return Ok(false);
        }

        if let Some(name) = name_command(line) {
            if name.is_empty() {
                debug!("Ignoring /name without a name");
            } else {
                self.ui
                    .handle_input(InputEvent::change(USER_NAME_FIELD_ID, name))?;
            }
            return Ok(true);
        }

        if line.is_empty() {
            return Ok(true);
        }

        self.ui
            .handle_input(InputEvent::change(MESSAGE_FIELD_ID, line))?;
        self.ui.handle_input(InputEvent::enter())?;
        Ok(true)
    }

    fn attach_ui_listeners(&self) -> Result<(), AppError> {
        let form_data = self.form_data.clone();
        self.ui.on_user_name_changed(move |name| {
            form_data.borrow_mut().user_name = name.to_string();
            Ok(())
        })?;

        let form_data = self.form_data.clone();
        self.ui.on_message_changed(move |message| {
            form_data.borrow_mut().user_message = message.to_string();
            Ok(())
        })?;

        let form_data = self.form_data.clone();
        let ui = Rc::downgrade(&self.ui);
        let connection = Rc::downgrade(&self.connection);
        self.ui.on_form_submitted(move || {
            let (Some(ui), Some(connection)) = (ui.upgrade(), connection.upgrade()) else {
                return Ok(());
            };

            let FormData {
                user_name,
                user_message,
            } = form_data.borrow().clone();

            if user_name.is_empty() || user_message.is_empty() {
                debug!("Submit ignored, name or message is empty");
                return Ok(());
            }

            connection.send_message(&user_name, &user_message)?;
            ui.display_message(&user_message, false, "")?;

            form_data.borrow_mut().user_message.clear();
            let reset = form_data.borrow().clone();
            ui.reset_form(&reset)?;
            Ok(())
        })?;

        Ok(())
    }

    fn attach_connection_listeners(&self) -> Result<(), AppError> {
        let ui = Rc::downgrade(&self.ui);
        self.connection.on_connected(move || {
            if let Some(ui) = ui.upgrade() {
                ui.set_form_disabled(false)?;
            }
            Ok(())
        })?;

        let ui = Rc::downgrade(&self.ui);
        self.connection.on_disconnected(move || {
            if let Some(ui) = ui.upgrade() {
                ui.set_form_disabled(true)?;
            }
            Ok(())
        })?;

        let ui = Rc::downgrade(&self.ui);
        self.connection.on_message_received(move |message| {
            if let Some(ui) = ui.upgrade() {
                ui.display_message(&message.text, true, &message.sender)?;
            }
            Ok(())
        })?;

        Ok(())
    }
}

/// The argument of a `/name` command, trimmed; `None` for any other line
fn name_command(line: &str) -> Option<&str> {
    let rest = line.strip_prefix("/name")?;
    if rest.is_empty() || rest.starts_with(char::is_whitespace) {
        Some(rest.trim())
    } else {
        None
    }
}
