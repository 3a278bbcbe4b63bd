mod persistable;

use proc_macro::TokenStream;

// ============================================================================
// #[derive(Persistable)] derive macro
// ============================================================================

/// Derive macro for the `Persistable` trait.
///
/// # Usage
///
/// ```ignore
/// #[derive(Clone, Serialize, Deserialize, Persistable)]
/// #[persistable(collection = "users")]
/// struct UserRecord {
///     #[persistable(id)]
///     pub user_id: String,
///     pub name: String,
///     pub age: u32,
/// }
/// ```
///
/// - `#[persistable(collection = "...")]` sets the collection name.
///   If omitted, defaults to snake_case struct name + "s".
/// - `#[persistable(id)]` marks the `String` field used as the primary key.
///   If omitted, defaults to a field named `id`.
#[proc_macro_derive(Persistable, attributes(persistable))]
pub fn derive_persistable(input: TokenStream) -> TokenStream {
    persistable::derive_persistable(input)
}
