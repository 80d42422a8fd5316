use crate::ast::{CombinatorKind, CompareOp, FilterExpression};
use crate::coerce::coerce;
use crate::config::QueryBuilderConfig;
use crate::errors::FiqlError;
use crate::query::{QueryClause, RangeOp};
use crate::schema::Schema;
use tracing::trace;

/// Single-use visitor turning a [`FilterExpression`] into a [`QueryClause`].
///
/// A translator accepts exactly one successful `visit`; create a new one per
/// expression. Nothing it holds is shared with other translators.
#[derive(Debug)]
pub struct QueryTranslator<'a> {
    schema: &'a Schema,
    config: &'a QueryBuilderConfig,
    query: Option<QueryClause>,
}

impl<'a> QueryTranslator<'a> {
    pub fn new(schema: &'a Schema, config: &'a QueryBuilderConfig) -> Self {
        Self {
            schema,
            config,
            query: None,
        }
    }

    /// Translate `node` and keep the result. On error no query is kept.
    pub fn visit(&mut self, node: &FilterExpression) -> Result<(), FiqlError> {
        if self.query.is_some() {
            return Err(FiqlError::IllegalState(
                "translator already produced a query, create a new one".to_string(),
            ));
        }
        self.query = Some(self.translate(node)?);
        Ok(())
    }

    pub fn query(&self) -> Result<&QueryClause, FiqlError> {
        self.query
            .as_ref()
            .ok_or_else(|| FiqlError::IllegalState("no query has been translated yet".to_string()))
    }

    pub fn into_query(self) -> Result<QueryClause, FiqlError> {
        self.query
            .ok_or_else(|| FiqlError::IllegalState("no query has been translated yet".to_string()))
    }

    fn translate(&self, node: &FilterExpression) -> Result<QueryClause, FiqlError> {
        match node {
            FilterExpression::Comparison {
                field,
                op,
                raw_value,
            } => self.comparison(field, *op, raw_value),
            FilterExpression::Combinator { kind, children } => {
                // An empty `should` matches every document in Elasticsearch.
                if children.len() < 2 {
                    return Err(FiqlError::malformed(
                        0,
                        format!(
                            "'{}' combinator needs at least two operands, got {}",
                            kind.separator(),
                            children.len()
                        ),
                    ));
                }
                let children = children
                    .iter()
                    .map(|child| self.translate(child))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(match kind {
                    CombinatorKind::And => QueryClause::must(children),
                    CombinatorKind::Or => QueryClause::should(children),
                })
            }
        }
    }

    fn comparison(
        &self,
        field: &str,
        op: CompareOp,
        raw_value: &str,
    ) -> Result<QueryClause, FiqlError> {
        let descriptor = self.schema.resolve(field)?;
        let value = coerce(raw_value, descriptor, op, self.config)?;
        let index_path = descriptor.index_path.as_str();
        trace!(field, index_path, %op, %value, "translated comparison");
        Ok(match RangeOp::from_compare(op) {
            Some(range) => QueryClause::range(index_path, range, value),
            None if op == CompareOp::NotEqual => {
                QueryClause::must_not(QueryClause::term(index_path, value))
            }
            None => QueryClause::term(index_path, value),
        })
    }
}
