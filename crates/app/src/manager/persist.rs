//! Persistence worker.
//!
//! A single task per manager drains persistence jobs in the order the actor
//! issued them, so writes to either store land in mutation order.

use std::sync::Arc;

use buybin::cart::Cart;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use crate::{
    identity::{Credential, SignedInUser},
    remote::RemoteCartStore,
    storage::GuestCartStore,
};

use super::state::Binding;

/// Work for the persistence worker.
///
/// A job writes to the store named by the binding it was issued under, never
/// the current one. `generation` tags the job's log lines with the session
/// it came from and does not gate the write.
#[derive(Debug)]
pub(super) enum Job {
    /// Overwrite the bound store with `cart`.
    Save {
        binding: Binding,
        generation: u64,
        cart: Cart,
    },

    /// Drop the bound store's cart. The guest entry is always removed.
    Clear { binding: Binding, generation: u64 },

    /// Remove the guest entry after it was merged into an account.
    ClearGuest { generation: u64 },

    /// Signal once every earlier job has been handled.
    Flush(oneshot::Sender<()>),
}

pub(super) struct Persister {
    guest: GuestCartStore,
    remote: Arc<dyn RemoteCartStore>,
}

impl Persister {
    pub(super) fn new(guest: GuestCartStore, remote: Arc<dyn RemoteCartStore>) -> Self {
        Self { guest, remote }
    }

    /// Start the worker. It stops once every sender is dropped.
    pub(super) fn spawn(self) -> mpsc::UnboundedSender<Job> {
        let (sender, receiver) = mpsc::unbounded_channel();

        tokio::spawn(self.run(receiver));

        sender
    }

    async fn run(self, mut jobs: mpsc::UnboundedReceiver<Job>) {
        while let Some(job) = jobs.recv().await {
            match job {
                Job::Save {
                    binding,
                    generation,
                    cart,
                } => self.save(&binding, generation, &cart).await,
                Job::Clear {
                    binding,
                    generation,
                } => self.clear(&binding, generation).await,
                Job::ClearGuest { generation } => self.clear_guest(generation).await,
                Job::Flush(done) => {
                    if done.send(()).is_err() {
                        debug!("flush requester went away");
                    }
                }
            }
        }

        debug!("persistence worker stopped");
    }

    async fn save(&self, binding: &Binding, generation: u64, cart: &Cart) {
        match binding {
            Binding::Guest => {
                if let Err(error) = self.guest.save(cart).await {
                    warn!(generation, %error, "failed to persist guest cart");
                }
            }
            Binding::User(user) => {
                let Some(credential) = credential_for(user).await else {
                    return;
                };

                match self.remote.save(user.id(), &credential, cart).await {
                    Ok(()) => debug!(
                        user_id = %user.id(),
                        generation,
                        lines = cart.len(),
                        "saved remote cart"
                    ),
                    Err(error) => warn!(
                        user_id = %user.id(),
                        generation,
                        %error,
                        "failed to persist remote cart"
                    ),
                }
            }
        }
    }

    async fn clear(&self, binding: &Binding, generation: u64) {
        if let Binding::User(user) = binding
            && let Some(credential) = credential_for(user).await
            && let Err(error) = self.remote.delete(user.id(), &credential).await
        {
            warn!(
                user_id = %user.id(),
                generation,
                %error,
                "failed to delete remote cart"
            );
        }

        self.clear_guest(generation).await;
    }

    async fn clear_guest(&self, generation: u64) {
        if let Err(error) = self.guest.clear().await {
            warn!(generation, %error, "failed to clear guest cart");
        }
    }
}

async fn credential_for(user: &SignedInUser) -> Option<Credential> {
    match user.credential().await {
        Ok(credential) => Some(credential),
        Err(error) => {
            warn!(user_id = %user.id(), %error, "no credential for remote cart write");
            None
        }
    }
}
