//! Fetch gateway contract between the model and whatever performs the IO.

use std::cell::RefCell;
use std::sync::Arc;

use activity_core::types::FetchRequest;

/// Issues activity fetches on behalf of the model.
///
/// `request` must not block. The implementation delivers exactly one
/// [`activity_core::FetchCompletion`] per request back to the model's owner,
/// which hands it to [`crate::ActivityModel::on_fetch_completed`]. Requests
/// are never retried by the gateway.
pub trait FetchGateway {
    fn request(&self, request: FetchRequest);
}

impl<T: FetchGateway + ?Sized> FetchGateway for &T {
    fn request(&self, request: FetchRequest) {
        (**self).request(request);
    }
}

impl<T: FetchGateway + ?Sized> FetchGateway for Arc<T> {
    fn request(&self, request: FetchRequest) {
        (**self).request(request);
    }
}

/// Gateway that only records what was asked of it. Completions are fed to
/// the model by the caller, which makes delivery order fully deterministic.
#[derive(Debug, Default)]
pub struct RecordingGateway {
    requests: RefCell<Vec<FetchRequest>>,
}

impl RecordingGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drain the requests issued since the last call.
    pub fn take_requests(&self) -> Vec<FetchRequest> {
        self.requests.take()
    }

    pub fn pending(&self) -> usize {
        self.requests.borrow().len()
    }
}

impl FetchGateway for RecordingGateway {
    fn request(&self, request: FetchRequest) {
        self.requests.borrow_mut().push(request);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(id: u64, account: &str) -> FetchRequest {
        FetchRequest {
            request_id: id,
            account_name: account.to_owned(),
            page: 0,
            page_size: 100,
        }
    }

    #[test]
    fn recording_gateway_drains() {
        let gw = RecordingGateway::new();
        gw.request(request(1, "a"));
        (&gw).request(request(2, "b"));
        assert_eq!(gw.pending(), 2);

        let taken = gw.take_requests();
        assert_eq!(taken.len(), 2);
        assert_eq!(taken[1].account_name, "b");
        assert_eq!(gw.pending(), 0);
    }
}
