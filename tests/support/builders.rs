use bakery::check::Check;
use bakery::condition::Condition;
use bakery::document::{Context, Document};
use bakery::event::{verdicts, Verdict};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Builds font-shaped documents for tests.
pub struct FontBuilder {
    path: String,
    attributes: serde_json::Map<String, Value>,
}

impl FontBuilder {
    pub fn new(path: &str) -> Self {
        Self {
            path: path.to_string(),
            attributes: serde_json::Map::new(),
        }
    }

    pub fn family(self, family: &str) -> Self {
        self.attr("family_name", json!(family))
    }

    pub fn style(self, style: &str) -> Self {
        self.attr("style_name", json!(style))
    }

    pub fn upm(self, upm: u64) -> Self {
        self.attr("units_per_em", json!(upm))
    }

    pub fn name_record(mut self, name_id: u16, string: &str) -> Self {
        let records = self
            .attributes
            .entry("name_records")
            .or_insert_with(|| json!([]));
        if let Value::Array(items) = records {
            items.push(json!({
                "platform_id": 3,
                "encoding_id": 1,
                "language_id": 1033,
                "name_id": name_id,
                "string": string,
            }));
        }
        self
    }

    pub fn attr(mut self, key: &str, value: Value) -> Self {
        self.attributes.insert(key.to_string(), value);
        self
    }

    pub fn build(self) -> Document {
        Document::new(self.path, Value::Object(self.attributes))
    }
}

/// Check that always passes with a fixed message.
pub fn passing(id: &str) -> Check {
    Check::single(id, |_| Ok(verdicts(vec![Verdict::pass("ok")])))
}

/// Condition that counts its evaluations and answers with `answer(context)`.
pub fn counted_condition<F>(name: &str, counter: Arc<AtomicUsize>, answer: F) -> Condition
where
    F: Fn(&Context) -> bool + Send + Sync + 'static,
{
    Condition::new(name, move |ctx| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(answer(ctx))
    })
}

/// Check that counts its invocations and passes.
pub fn counted_check(id: &str, counter: Arc<AtomicUsize>) -> Check {
    Check::single(id, move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(verdicts(vec![Verdict::pass("ran")]))
    })
}
