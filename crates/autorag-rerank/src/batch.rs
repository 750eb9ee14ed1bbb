use std::future::Future;

use autorag_core::ShapeMismatchError;
use futures::StreamExt;
use futures::stream;

use crate::error::RerankError;

/// Runs `tasks` with at most `batch_size` of them in flight and returns
/// their outputs in input order.
///
/// A new task is started as soon as any running one finishes. The first
/// error ends the whole call and drops every task still pending, as does
/// dropping the returned future.
pub async fn process_batch<I, F, T>(tasks: I, batch_size: usize) -> Result<Vec<T>, RerankError>
where
    I: IntoIterator<Item = F>,
    F: Future<Output = Result<T, RerankError>>,
{
    if batch_size == 0 {
        return Err(RerankError::InvalidInput(
            "batch size must be greater than zero".to_string(),
        ));
    }

    let tasks: Vec<F> = tasks.into_iter().collect();
    let total = tasks.len();
    let mut slots: Vec<Option<T>> = std::iter::repeat_with(|| None).take(total).collect();

    let mut in_flight = stream::iter(
        tasks
            .into_iter()
            .enumerate()
            .map(|(index, task)| async move { (index, task.await) }),
    )
    .buffer_unordered(batch_size);

    while let Some((index, outcome)) = in_flight.next().await {
        let value = outcome?;
        if let Some(slot) = slots.get_mut(index) {
            *slot = Some(value);
        }
    }

    let outputs: Vec<T> = slots.into_iter().flatten().collect();
    if outputs.len() != total {
        return Err(ShapeMismatchError::Rows {
            what: "batch outputs".to_string(),
            expected: total,
            found: outputs.len(),
        }
        .into());
    }
    Ok(outputs)
}
