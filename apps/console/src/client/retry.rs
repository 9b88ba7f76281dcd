use crate::client::context::{ApiResponse, RequestContext};
use crate::client::dispatcher::Dispatcher;
use crate::errors::ApiError;
use crate::session::SessionTokens;

/// Replays a call once with freshly renewed tokens.
///
/// Marks the context as retried before sending, so a second expiry failure on
/// the replay can never start another renewal. The replay's outcome is
/// returned as-is.
pub(crate) async fn replay(
    dispatcher: &Dispatcher,
    ctx: &mut RequestContext,
    tokens: &SessionTokens,
) -> Result<ApiResponse, ApiError> {
    ctx.mark_retried();
    dispatcher.send_with(ctx, tokens.access()).await
}
