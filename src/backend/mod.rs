//! Backend actor and the channels that connect it to the UI

pub mod actor;
pub mod messages;

pub use actor::BackendActor;
pub use messages::{BackendCommand, BackendEvent, BackendHandle};

use crate::utils::AppSettings;
use futures::SinkExt;
use iced::subscription::{self, Subscription};
use tokio::sync::mpsc;
use tracing::{error, info};

/// Bounded inbox/outbox sizes
const COMMAND_BUFFER: usize = 32;
const EVENT_BUFFER: usize = 128;

/// Start the backend actor and stream its events into the iced runtime.
///
/// The first event is [`BackendEvent::Ready`] carrying the handle the UI
/// sends commands through.
pub fn connect(settings: AppSettings) -> Subscription<BackendEvent> {
    struct Backend;

    subscription::channel(
        std::any::TypeId::of::<Backend>(),
        EVENT_BUFFER,
        move |mut output| async move {
            let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
            let (event_tx, mut event_rx) = mpsc::channel(EVENT_BUFFER);

            if output
                .send(BackendEvent::Ready(BackendHandle::new(command_tx)))
                .await
                .is_err()
            {
                error!("UI stopped listening before the backend started");
            }

            tokio::spawn(async move {
                BackendActor::new(settings, command_rx, event_tx)
                    .await
                    .run()
                    .await;
            });

            while let Some(event) = event_rx.recv().await {
                if output.send(event).await.is_err() {
                    break;
                }
            }

            info!("Backend event stream closed");
            loop {
                futures::future::pending::<()>().await;
            }
        },
    )
}
