//! Request envelopes for the two write endpoints.
//!
//! `submitTransaction` applies a flat operation list immediately and is used
//! for record creation. `saveTransactions` takes one or more transactions,
//! each stamped with its own id and the space it targets, and is used for
//! attribute updates.

use pagekit_records::Identifier;
use serde::Serialize;

use crate::operation::Operation;

pub const SUBMIT_ENDPOINT: &str = "submitTransaction";
pub const SAVE_ENDPOINT: &str = "saveTransactions";

/// Body of `submitTransaction`.
#[derive(Debug, Clone, Serialize)]
pub struct SubmitTransactionRequest<'a> {
    pub operations: &'a [Operation],
}

/// One transaction inside a `saveTransactions` request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction<'a> {
    pub id: Identifier,
    pub space_id: Identifier,
    pub operations: &'a [Operation],
}

/// Body of `saveTransactions`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveTransactionsRequest<'a> {
    pub request_id: Identifier,
    pub transactions: Vec<Transaction<'a>>,
}

impl<'a> SaveTransactionsRequest<'a> {
    /// Wrap `operations` in a single transaction with fresh request and
    /// transaction ids.
    pub fn single(space_id: Identifier, operations: &'a [Operation]) -> Self {
        Self {
            request_id: Identifier::generate(),
            transactions: vec![Transaction {
                id: Identifier::generate(),
                space_id,
                operations,
            }],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::Operation;
    use pagekit_records::{table, AttrPath};
    use serde_json::json;

    fn op() -> Operation {
        Operation::set(
            Identifier::parse("11111111222233334444555555555555").unwrap(),
            table::BLOCK,
            AttrPath::property("title"),
            json!([["x"]]),
        )
    }

    #[test]
    fn submit_body_is_operation_list() {
        let ops = vec![op()];
        let body = serde_json::to_value(SubmitTransactionRequest { operations: &ops }).unwrap();
        assert_eq!(body["operations"].as_array().unwrap().len(), 1);
        assert_eq!(body.as_object().unwrap().len(), 1);
    }

    #[test]
    fn save_body_shape() {
        let space = Identifier::parse("aaaaaaaabbbbccccddddeeeeeeeeeeee").unwrap();
        let ops = vec![op(), op()];
        let request = SaveTransactionsRequest::single(space, &ops);
        let body = serde_json::to_value(&request).unwrap();

        assert!(body["requestId"].is_string());
        let transactions = body["transactions"].as_array().unwrap();
        assert_eq!(transactions.len(), 1);
        assert_eq!(transactions[0]["spaceId"], json!(space.to_string()));
        assert_eq!(transactions[0]["operations"].as_array().unwrap().len(), 2);
        assert_ne!(transactions[0]["id"], body["requestId"]);
    }

    #[test]
    fn ids_are_fresh_per_request() {
        let space = Identifier::generate();
        let ops = vec![op()];
        let a = SaveTransactionsRequest::single(space, &ops);
        let b = SaveTransactionsRequest::single(space, &ops);
        assert_ne!(a.request_id, b.request_id);
        assert_ne!(a.transactions[0].id, b.transactions[0].id);
    }
}
