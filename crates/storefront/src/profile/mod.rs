//! Customer profile: delivery addresses and payment methods.
//!
//! Both lists carry the same invariant: at most one entry is the default,
//! and a non-empty list always has exactly one default. One generic
//! algorithm enforces it for both entity kinds.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;

use greenbasket_core::{AddressId, CustomerId, PaymentMethodId};

/// A saved delivery address.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub id: AddressId,
    /// Label, e.g. "Home" or "Office".
    pub name: String,
    /// Free-text street address.
    pub address: String,
    /// Extra directions for the rider.
    pub details: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub is_default: bool,
}

/// Which payment rail a method uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentKind {
    Momo,
    Card,
}

/// Payment instrument details, tagged by kind.
///
/// Replaces the historical pipe-delimited encoding
/// (`"number|provider|name"`); [`PaymentDetails::from_legacy`] parses that
/// form for data migrated from older clients.
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PaymentDetails {
    #[serde(rename_all = "camelCase")]
    Momo {
        number: String,
        provider: String,
        account_name: String,
    },
    #[serde(rename_all = "camelCase")]
    Card {
        number: String,
        holder: String,
        expiry: String,
        cvv: String,
    },
}

impl PaymentDetails {
    /// Which rail these details belong to.
    #[must_use]
    pub const fn kind(&self) -> PaymentKind {
        match self {
            Self::Momo { .. } => PaymentKind::Momo,
            Self::Card { .. } => PaymentKind::Card,
        }
    }

    /// Parse the historical pipe-delimited encoding for the given kind.
    ///
    /// # Errors
    ///
    /// Returns [`ProfileError::MalformedDetails`] when the field count does
    /// not match the kind.
    pub fn from_legacy(kind: PaymentKind, details: &str) -> Result<Self, ProfileError> {
        let fields: Vec<&str> = details.split('|').collect();
        match (kind, fields.as_slice()) {
            (PaymentKind::Momo, [number, provider, account_name]) => Ok(Self::Momo {
                number: (*number).to_string(),
                provider: (*provider).to_string(),
                account_name: (*account_name).to_string(),
            }),
            (PaymentKind::Card, [number, holder, expiry, cvv]) => Ok(Self::Card {
                number: (*number).to_string(),
                holder: (*holder).to_string(),
                expiry: (*expiry).to_string(),
                cvv: (*cvv).to_string(),
            }),
            _ => Err(ProfileError::MalformedDetails {
                kind,
                fields: fields.len(),
            }),
        }
    }
}

// Card numbers and CVVs must not leak into logs.
impl std::fmt::Debug for PaymentDetails {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Momo {
                number,
                provider,
                account_name,
            } => f
                .debug_struct("Momo")
                .field("number", number)
                .field("provider", provider)
                .field("account_name", account_name)
                .finish(),
            Self::Card {
                number,
                holder,
                expiry,
                ..
            } => {
                let last4 = number.chars().rev().take(4).collect::<String>();
                let last4: String = last4.chars().rev().collect();
                f.debug_struct("Card")
                    .field("number", &format!("****{last4}"))
                    .field("holder", holder)
                    .field("expiry", expiry)
                    .field("cvv", &"[REDACTED]")
                    .finish()
            }
        }
    }
}

/// A saved payment method.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentMethod {
    pub id: PaymentMethodId,
    /// Label, e.g. "Personal MoMo".
    pub name: String,
    #[serde(flatten)]
    pub details: PaymentDetails,
    pub is_default: bool,
}

/// Errors from profile mutations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProfileError {
    #[error("address {0} not found")]
    AddressNotFound(AddressId),

    #[error("payment method {0} not found")]
    PaymentMethodNotFound(PaymentMethodId),

    #[error("malformed {kind:?} details: got {fields} fields")]
    MalformedDetails { kind: PaymentKind, fields: usize },
}

/// An entry in a list that carries the single-default invariant.
trait DefaultEntry {
    type Id: Copy + PartialEq;

    fn entry_id(&self) -> Self::Id;
    fn is_default(&self) -> bool;
    fn set_default(&mut self, value: bool);
}

impl DefaultEntry for Address {
    type Id = AddressId;

    fn entry_id(&self) -> AddressId {
        self.id
    }

    fn is_default(&self) -> bool {
        self.is_default
    }

    fn set_default(&mut self, value: bool) {
        self.is_default = value;
    }
}

impl DefaultEntry for PaymentMethod {
    type Id = PaymentMethodId;

    fn entry_id(&self) -> PaymentMethodId {
        self.id
    }

    fn is_default(&self) -> bool {
        self.is_default
    }

    fn set_default(&mut self, value: bool) {
        self.is_default = value;
    }
}

/// Upsert an entry while maintaining the single-default invariant.
///
/// If the incoming entry claims the default, every existing entry loses it
/// unconditionally. Otherwise, if the list is empty or this save targets the
/// list's only entry, the default is forced on regardless of the caller's
/// value - a non-empty list always has a default. Saving a second
/// non-default entry alongside an existing default leaves that default
/// untouched. If the save demotes the current default (re-saving it with
/// the flag off), the first entry is promoted so the list never ends up
/// default-less.
fn save_entry<E: DefaultEntry>(entries: &mut Vec<E>, mut entry: E) {
    if entry.is_default() {
        for existing in entries.iter_mut() {
            existing.set_default(false);
        }
    } else if entries.is_empty()
        || (entries.len() == 1
            && entries
                .first()
                .is_some_and(|only| only.entry_id() == entry.entry_id()))
    {
        entry.set_default(true);
    }

    if let Some(existing) = entries
        .iter_mut()
        .find(|e| e.entry_id() == entry.entry_id())
    {
        *existing = entry;
    } else {
        entries.push(entry);
    }

    // Editing the current default to non-default would otherwise leave the
    // list with none; promote the first entry, as deletion does.
    if !entries.iter().any(DefaultEntry::is_default)
        && let Some(first) = entries.first_mut()
    {
        first.set_default(true);
    }
}

/// Remove an entry; if it held the default, promote the first remaining
/// entry (list-order tie-break, no recency heuristic). Returns whether the
/// id was present.
fn delete_entry<E: DefaultEntry>(entries: &mut Vec<E>, id: E::Id) -> bool {
    let Some(pos) = entries.iter().position(|e| e.entry_id() == id) else {
        return false;
    };
    let removed = entries.remove(pos);
    if removed.is_default()
        && let Some(first) = entries.first_mut()
    {
        first.set_default(true);
    }
    true
}

/// A customer's saved addresses and payment methods.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerProfile {
    pub customer_id: CustomerId,
    addresses: Vec<Address>,
    payment_methods: Vec<PaymentMethod>,
}

impl CustomerProfile {
    /// Create a profile with no saved entries.
    #[must_use]
    pub const fn new(customer_id: CustomerId) -> Self {
        Self {
            customer_id,
            addresses: Vec::new(),
            payment_methods: Vec::new(),
        }
    }

    /// Save (insert or replace) an address.
    #[instrument(skip(self, address), fields(customer_id = %self.customer_id, address_id = %address.id))]
    pub fn save_address(&mut self, address: Address) {
        save_entry(&mut self.addresses, address);
    }

    /// Delete an address, promoting a new default if needed.
    ///
    /// # Errors
    ///
    /// Returns [`ProfileError::AddressNotFound`] for an unknown id.
    #[instrument(skip(self), fields(customer_id = %self.customer_id))]
    pub fn delete_address(&mut self, id: AddressId) -> Result<(), ProfileError> {
        if delete_entry(&mut self.addresses, id) {
            Ok(())
        } else {
            Err(ProfileError::AddressNotFound(id))
        }
    }

    /// Save (insert or replace) a payment method.
    #[instrument(skip(self, method), fields(customer_id = %self.customer_id, method_id = %method.id))]
    pub fn save_payment_method(&mut self, method: PaymentMethod) {
        save_entry(&mut self.payment_methods, method);
    }

    /// Delete a payment method, promoting a new default if needed.
    ///
    /// # Errors
    ///
    /// Returns [`ProfileError::PaymentMethodNotFound`] for an unknown id.
    #[instrument(skip(self), fields(customer_id = %self.customer_id))]
    pub fn delete_payment_method(&mut self, id: PaymentMethodId) -> Result<(), ProfileError> {
        if delete_entry(&mut self.payment_methods, id) {
            Ok(())
        } else {
            Err(ProfileError::PaymentMethodNotFound(id))
        }
    }

    /// The default address, if any entries exist.
    #[must_use]
    pub fn default_address(&self) -> Option<&Address> {
        self.addresses.iter().find(|a| a.is_default)
    }

    /// The default payment method, if any entries exist.
    #[must_use]
    pub fn default_payment_method(&self) -> Option<&PaymentMethod> {
        self.payment_methods.iter().find(|m| m.is_default)
    }

    /// Saved addresses, in insertion order.
    #[must_use]
    pub fn addresses(&self) -> &[Address] {
        &self.addresses
    }

    /// Saved payment methods, in insertion order.
    #[must_use]
    pub fn payment_methods(&self) -> &[PaymentMethod] {
        &self.payment_methods
    }
}
