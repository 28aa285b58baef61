//! Procedural macros for end-to-end deployment tests.
use proc_macro::TokenStream;

mod test;

/// Defines an end-to-end deployment test that injects funded accounts through
/// its arguments.
///
/// Every argument must have a type exposing `async fn new() ->
/// eyre::Result<Self>`, usually `deployer::Account`.
///
/// # Examples
///
/// ```rust,ignore
/// #[deployer::test]
/// async fn mints_token_zero(alice: Account) -> eyre::Result<()> {
///     let harness = Harness::with_account(config(&alice), alice).await?;
///     let minted = svg_nft::deploy_and_mint(&harness).await?;
///     assert_eq!(minted.token_id, U256::ZERO);
///     Ok(())
/// }
/// ```
#[proc_macro_attribute]
pub fn test(attr: TokenStream, input: TokenStream) -> TokenStream {
    test::test(attr, input)
}
