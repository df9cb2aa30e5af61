//! Shared fixtures: a scripted completion backend and canned model replies.
use std::cell::RefCell;

use workshop_mapper::error::LlmError;
use workshop_mapper::llm::{
    CompletionBackend, CompletionRequest, ExtractionClient, ExtractionSettings,
};
use workshop_mapper::pipeline::Pipeline;

/// Replays canned replies in order and remembers every request.
pub struct Scripted {
    replies: RefCell<Vec<Result<String, LlmError>>>,
    pub seen: RefCell<Vec<CompletionRequest>>,
}

#[allow(dead_code)]
impl Scripted {
    pub fn new(replies: Vec<Result<String, LlmError>>) -> Self {
        Self {
            replies: RefCell::new(replies),
            seen: RefCell::new(Vec::new()),
        }
    }

    pub fn always(reply: &str) -> Self {
        Self::new((0..8).map(|_| Ok(reply.to_string())).collect())
    }

    pub fn models(&self) -> Vec<String> {
        self.seen.borrow().iter().map(|r| r.model.clone()).collect()
    }
}

impl CompletionBackend for Scripted {
    fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        self.seen.borrow_mut().push(request.clone());
        let mut replies = self.replies.borrow_mut();
        if replies.is_empty() {
            return Err(LlmError::EmptyResponse);
        }
        replies.remove(0)
    }
}

#[allow(dead_code)]
pub fn pipeline(backend: &Scripted) -> Pipeline<&Scripted> {
    Pipeline::new(ExtractionClient::new(backend, ExtractionSettings::default()))
}

#[allow(dead_code)]
pub fn unavailable() -> LlmError {
    LlmError::Http {
        status: 500,
        body: "upstream error".to_string(),
    }
}

#[allow(dead_code)]
pub const TRANSCRIPT: &str = "Ana: Recibimos el pedido por correo. Carlos: Yo lo reviso y, si falta stock, aviso a compras.\nAna: Luego se factura.";

/// Nested reply wrapped in chatter, the way chat models tend to answer.
#[allow(dead_code)]
pub const NESTED_REPLY: &str = r#"Claro, aquí tienes el análisis:
```json
{
  "summary": "Order intake at ACME",
  "organization": {
    "nodes": [
      {"name": "ACME", "type": "company", "parent": null},
      {"name": "Sales", "type": "department", "parent": "ACME"},
      {"name": "Purchasing", "type": "department", "parent": "ACME"}
    ]
  },
  "process": {
    "steps": [
      {"name": "Receive order", "type": "start", "department": "Sales"},
      {"name": "Check stock", "type": "decision", "department": "Sales",
       "options": [{"label": "in stock", "next": "Invoice"}, {"label": "missing", "next": "Notify purchasing"}]},
      {"name": "Notify purchasing", "type": "task", "department": "Purchasing"},
      {"name": "Invoice", "type": "end", "department": "Sales"}
    ]
  },
  "participants": [
    {"name": "Carlos", "role": "Sales lead", "department": "Sales", "responsibilities": ["review orders"]}
  ],
  "pains": ["orders arrive by email {unstructured}"]
}
```
¿Algo más?"#;
