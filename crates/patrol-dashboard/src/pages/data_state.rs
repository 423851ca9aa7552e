use futures::channel::oneshot;
use patrol_client_core::RequestError;
use tracing::error;

#[derive(Debug)]
pub struct AwaitingType<T>(pub oneshot::Receiver<Result<T, RequestError>>);

#[derive(Debug, Default)]
pub enum DataState<T> {
    #[default]
    None,
    AwaitingResponse(AwaitingType<T>),
    Present(T),
    Failed(RequestError),
}

impl<T> DataState<T> {
    /// Attempts to load the data
    ///
    /// Some branches lead to no UI being displayed, in particular when the data
    /// is received or an error is received. If a ui is passed then spinners
    /// and error messages will show as applicable
    ///
    /// Does nothing once the data is present
    pub fn get<F>(&mut self, ui: Option<&mut egui::Ui>, retry_msg: Option<&str>, fetch_fn: F)
    where
        F: FnOnce() -> AwaitingType<T>,
    {
        match self {
            DataState::None => {
                if let Some(ui) = ui {
                    ui.spinner();
                }
                let rx = fetch_fn();
                *self = DataState::AwaitingResponse(rx);
            }
            DataState::AwaitingResponse(rx) => {
                if let Some(new_state) = Self::await_data(ui, rx) {
                    *self = new_state;
                }
            }
            DataState::Present(_) => {}
            DataState::Failed(e) => {
                if let Some(ui) = ui {
                    ui.colored_label(ui.visuals().error_fg_color, format!("Error: {e}"));
                    if ui.button(retry_msg.unwrap_or("Reintentar")).clicked() {
                        *self = DataState::default();
                    }
                }
            }
        }
    }

    pub fn await_data(ui: Option<&mut egui::Ui>, rx: &mut AwaitingType<T>) -> Option<Self> {
        Some(match rx.0.try_recv() {
            Ok(recv_opt) => match recv_opt {
                Some(outcome_result) => match outcome_result {
                    Ok(data) => DataState::Present(data),
                    Err(e) => {
                        error!(?e, "Error response received instead of the data");
                        DataState::Failed(e)
                    }
                },
                None => {
                    if let Some(ui) = ui {
                        ui.spinner();
                    }
                    return None;
                }
            },
            Err(e) => {
                error!(?e, "Error receiving on channel");
                DataState::Failed(RequestError::Network(format!(
                    "Error receiving on channel. Error: {e:?}"
                )))
            }
        })
    }

    pub fn present(&self) -> Option<&T> {
        match self {
            DataState::Present(data) => Some(data),
            _ => None,
        }
    }

    /// Returns `true` if the data state is [`Present`].
    ///
    /// [`Present`]: DataState::Present
    #[must_use]
    pub fn is_present(&self) -> bool {
        matches!(self, Self::Present(..))
    }

    /// The backend said the session is gone
    #[must_use]
    pub fn is_unauthenticated(&self) -> bool {
        matches!(self, Self::Failed(RequestError::Unauthenticated))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn moves_from_waiting_to_present() {
        let (tx, rx) = oneshot::channel();
        let mut state = DataState::<u8>::None;
        state.get(None, None, || AwaitingType(rx));
        assert!(matches!(state, DataState::AwaitingResponse(_)));
        state.get(None, None, || unreachable!());
        assert!(matches!(state, DataState::AwaitingResponse(_)));

        tx.send(Ok(7)).unwrap();
        state.get(None, None, || unreachable!());
        assert_eq!(state.present(), Some(&7));
    }

    #[test]
    fn dropped_sender_is_a_failure() {
        let (tx, rx) = oneshot::channel::<Result<u8, RequestError>>();
        let mut state = DataState::None;
        state.get(None, None, || AwaitingType(rx));
        drop(tx);
        state.get(None, None, || unreachable!());
        assert!(matches!(state, DataState::Failed(RequestError::Network(_))));
    }

    #[test]
    fn unauthenticated_is_reported() {
        let (tx, rx) = oneshot::channel();
        let mut state = DataState::<u8>::None;
        state.get(None, None, || AwaitingType(rx));
        tx.send(Err(RequestError::Unauthenticated)).unwrap();
        state.get(None, None, || unreachable!());
        assert!(state.is_unauthenticated());
    }
}
