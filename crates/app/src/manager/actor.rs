//! Cart actor.
//!
//! Owns the session cart and its binding. Commands are handled one at a
//! time, in arrival order; a sign-in or sign-out runs to completion before
//! the next command is looked at.

use std::{num::NonZeroU32, sync::Arc};

use buybin::{
    merge::merge_carts,
    pricing::{DiscountPercent, ShippingOption},
    products::{Product, ProductError, ProductId},
};
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, info, warn};

use crate::{
    identity::SignedInUser,
    remote::RemoteCartStore,
    storage::GuestCartStore,
};

use super::{
    Transition,
    persist::{Job, Persister},
    state::{Binding, CartState},
};

/// Requests accepted by the actor. Each carries a reply channel.
#[derive(Debug)]
pub(super) enum Command {
    Add {
        product: Product,
        quantity: NonZeroU32,
        reply: oneshot::Sender<Result<(), ProductError>>,
    },
    UpdateQuantity {
        product_id: ProductId,
        quantity: u32,
        reply: oneshot::Sender<bool>,
    },
    Remove {
        product_id: ProductId,
        reply: oneshot::Sender<bool>,
    },
    Clear {
        reply: oneshot::Sender<()>,
    },
    SetDiscount {
        discount: DiscountPercent,
        reply: oneshot::Sender<()>,
    },
    SetShipping {
        shipping: ShippingOption,
        reply: oneshot::Sender<()>,
    },
    AuthChanged {
        user: Option<SignedInUser>,
        reply: oneshot::Sender<Transition>,
    },
    Flush {
        reply: oneshot::Sender<()>,
    },
}

fn respond<T>(reply: oneshot::Sender<T>, value: T) {
    if reply.send(value).is_err() {
        debug!("cart manager caller went away before the reply");
    }
}

pub(super) struct CartActor {
    state: CartState,
    binding: Binding,
    guest: GuestCartStore,
    remote: Arc<dyn RemoteCartStore>,
    jobs: mpsc::UnboundedSender<Job>,
    publisher: watch::Sender<CartState>,
}

impl CartActor {
    pub(super) fn new(
        guest: GuestCartStore,
        remote: Arc<dyn RemoteCartStore>,
        publisher: watch::Sender<CartState>,
    ) -> Self {
        let jobs = Persister::new(guest.clone(), Arc::clone(&remote)).spawn();

        Self {
            state: CartState::loading(),
            binding: Binding::Guest,
            guest,
            remote,
            jobs,
            publisher,
        }
    }

    pub(super) async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>) {
        self.state.cart = self.guest.load().await;
        self.state.loading = false;
        self.publish();

        debug!(lines = self.state.cart.len(), "loaded guest cart");

        while let Some(command) = commands.recv().await {
            self.handle(command).await;
        }

        debug!("cart manager stopped");
    }

    async fn handle(&mut self, command: Command) {
        match command {
            Command::Add {
                product,
                quantity,
                reply,
            } => {
                let result = self.state.cart.add(&product, quantity);

                if result.is_ok() {
                    self.changed();
                }

                respond(reply, result);
            }
            Command::UpdateQuantity {
                product_id,
                quantity,
                reply,
            } => {
                let updated = self.state.cart.update_quantity(&product_id, quantity);

                if updated {
                    self.changed();
                }

                respond(reply, updated);
            }
            Command::Remove { product_id, reply } => {
                let removed = self.state.cart.remove(&product_id);

                if removed {
                    self.changed();
                }

                respond(reply, removed);
            }
            Command::Clear { reply } => {
                self.clear();
                respond(reply, ());
            }
            Command::SetDiscount { discount, reply } => {
                self.state.policy.discount = discount;
                self.publish();
                respond(reply, ());
            }
            Command::SetShipping { shipping, reply } => {
                self.state.policy.shipping = shipping;
                self.publish();
                respond(reply, ());
            }
            Command::AuthChanged { user, reply } => {
                let transition = match user {
                    Some(user) => self.sign_in(user).await,
                    None => self.sign_out().await,
                };

                respond(reply, transition);
            }
            Command::Flush { reply } => {
                self.flush().await;
                respond(reply, ());
            }
        }
    }

    fn publish(&self) {
        self.publisher.send_replace(self.state.clone());
    }

    fn enqueue(&self, job: Job) {
        if self.jobs.send(job).is_err() {
            warn!("persistence worker stopped; dropping write");
        }
    }

    /// Publish the mutated cart and persist it to the bound store.
    fn changed(&self) {
        self.publish();
        self.enqueue(Job::Save {
            binding: self.binding.clone(),
            generation: self.state.generation,
            cart: self.state.cart.clone(),
        });
    }

    fn clear(&mut self) {
        self.state.cart.clear();
        self.state.policy.reset();
        self.publish();
        self.enqueue(Job::Clear {
            binding: self.binding.clone(),
            generation: self.state.generation,
        });
    }

    /// Wait for every write issued so far to finish.
    async fn flush(&self) {
        let (done, flushed) = oneshot::channel();
        self.enqueue(Job::Flush(done));

        if flushed.await.is_err() {
            warn!("persistence worker stopped before flushing");
        }
    }

    fn begin_transition(&mut self) {
        self.state.loading = true;
        self.publish();
    }

    fn finish_transition(&mut self) {
        self.state.loading = false;
        self.publish();
    }

    async fn sign_in(&mut self, user: SignedInUser) -> Transition {
        if self.binding.user_id() == Some(user.id()) {
            debug!(user_id = %user.id(), "already signed in");
            return Transition::SignedIn;
        }

        if matches!(self.binding, Binding::User(_)) {
            self.sign_out().await;
        }

        self.begin_transition();

        // Pending guest writes must land before the guest entry is read.
        self.flush().await;

        let credential = match user.credential().await {
            Ok(credential) => credential,
            Err(error) => {
                warn!(user_id = %user.id(), %error, "sign-in aborted: no credential");
                self.finish_transition();
                return Transition::CredentialUnavailable;
            }
        };

        let (local, remote) = tokio::join!(
            self.guest.load(),
            self.remote.fetch(user.id(), &credential)
        );

        let remote = match remote {
            Ok(remote) => remote.unwrap_or_default(),
            Err(error) => {
                warn!(user_id = %user.id(), %error, "sign-in aborted: remote cart unreadable");
                self.finish_transition();
                return Transition::RemoteUnavailable;
            }
        };

        let merged = merge_carts(local, remote);

        info!(
            user_id = %user.id(),
            lines = merged.len(),
            "merged guest cart into account"
        );

        self.state.generation += 1;
        self.state.cart = merged;
        self.state.user = Some(user.id().clone());
        self.binding = Binding::User(user);

        self.enqueue(Job::Save {
            binding: self.binding.clone(),
            generation: self.state.generation,
            cart: self.state.cart.clone(),
        });
        self.enqueue(Job::ClearGuest {
            generation: self.state.generation,
        });

        self.finish_transition();

        Transition::SignedIn
    }

    async fn sign_out(&mut self) -> Transition {
        let Some(user_id) = self.binding.user_id().cloned() else {
            debug!("sign-out while already a guest");
            return Transition::SignedOut;
        };

        self.begin_transition();

        // The account's pending writes finish before the guest entry is read.
        self.flush().await;

        self.state.generation += 1;
        self.state.user = None;
        self.binding = Binding::Guest;
        self.state.cart = self.guest.load().await;

        info!(
            %user_id,
            lines = self.state.cart.len(),
            "signed out; restored guest cart"
        );

        self.finish_transition();

        Transition::SignedOut
    }
}
