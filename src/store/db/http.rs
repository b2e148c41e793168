use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use tracing::trace;

use crate::{
    CareflowError, HttpConfig, Result,
    model::{WorkflowModel, WorkflowPayload},
    store::WorkflowCollection,
};

const WORKFLOWS_PATH: &str = "workflows";

/// Workflow collection backed by the remote `workflows` resource.
#[derive(Debug, Clone)]
pub struct HttpStore {
    client: Client,
    base_url: String,
}

impl HttpStore {
    pub fn new(config: &HttpConfig) -> Result<Self> {
        if config.base_url.trim().is_empty() {
            return Err(CareflowError::Config("store.http.base_url is empty".into()));
        }
        let client = Client::builder().timeout(Duration::from_millis(config.timeout_ms)).build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim().trim_end_matches('/').to_string(),
        })
    }

    fn collection_url(&self) -> String {
        format!("{}/{}", self.base_url, WORKFLOWS_PATH)
    }

    fn document_url(
        &self,
        id: &str,
    ) -> String {
        format!("{}/{}/{}", self.base_url, WORKFLOWS_PATH, id)
    }

    async fn read_json<T: serde::de::DeserializeOwned>(response: Response) -> Result<T> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CareflowError::Persistence(format!("workflow api returned {}: {}", status, body)));
        }
        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl WorkflowCollection for HttpStore {
    async fn list(&self) -> Result<Vec<WorkflowModel>> {
        let url = self.collection_url();
        trace!("http::list({})", url);
        let response = self.client.get(&url).send().await?;
        Self::read_json(response).await
    }

    async fn create(
        &self,
        payload: &WorkflowPayload,
    ) -> Result<WorkflowModel> {
        let url = self.collection_url();
        trace!("http::create({})", url);
        let response = self.client.post(&url).json(payload).send().await?;
        Self::read_json(response).await
    }

    async fn update(
        &self,
        id: &str,
        payload: &WorkflowPayload,
    ) -> Result<WorkflowModel> {
        let url = self.document_url(id);
        trace!("http::update({})", url);
        let response = self.client.put(&url).json(payload).send().await?;
        Self::read_json(response).await
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};
    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::{TcpListener, TcpStream},
        task::JoinHandle,
    };

    use super::*;
    use crate::{
        Audience, TriggerType,
        workflow::{StepType, compiler, template},
    };

    fn config(base_url: &str) -> HttpConfig {
        HttpConfig {
            base_url: base_url.to_string(),
            timeout_ms: 1000,
        }
    }

    #[test]
    fn test_urls() {
        let store = HttpStore::new(&config("http://localhost:8080/api/")).unwrap();
        assert_eq!(store.collection_url(), "http://localhost:8080/api/workflows");
        assert_eq!(store.document_url("wf-1"), "http://localhost:8080/api/workflows/wf-1");
    }

    #[test]
    fn test_empty_base_url() {
        assert!(matches!(HttpStore::new(&config("  ")), Err(CareflowError::Config(_))));
    }

    #[tokio::test]
    async fn test_unreachable_api_is_persistence_error() {
        let store = HttpStore::new(&config("http://127.0.0.1:9")).unwrap();
        assert!(matches!(store.list().await, Err(CareflowError::Persistence(_))));
    }

    /// Reads one request (head plus `content-length` body) off the socket.
    async fn read_request(socket: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
            let text = String::from_utf8_lossy(&buf).to_string();
            if let Some(end) = text.find("\r\n\r\n") {
                let length = text[..end]
                    .lines()
                    .filter_map(|line| line.split_once(':'))
                    .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
                    .and_then(|(_, value)| value.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if buf.len() >= end + 4 + length {
                    break;
                }
            }
        }
        String::from_utf8(buf).unwrap()
    }

    /// Serves a single canned response and hands back the raw request it received.
    async fn serve_once(
        status: &'static str,
        body: String,
    ) -> (HttpStore, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let request = read_request(&mut socket).await;
            let response = format!(
                "HTTP/1.1 {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
            request
        });
        let store = HttpStore::new(&config(&format!("http://{}/api", addr))).unwrap();
        (store, handle)
    }

    fn payload() -> WorkflowPayload {
        let definition = template::default_tree();
        let steps = compiler::compile(&definition).unwrap();
        WorkflowPayload {
            name: "Booking".to_string(),
            trigger_type: TriggerType::AppointmentCreated,
            audience: Audience::New,
            definition,
            steps,
        }
    }

    fn stored(id: &str) -> String {
        json!({
            "id": id,
            "name": "Booking",
            "triggerType": "APPOINTMENT_CREATED",
            "audience": "NEW",
            "definition": [{ "id": "t", "kind": "trigger", "children": [
                { "id": "d", "kind": "delay", "config": { "duration": "30m" } }
            ] }],
            "steps": [{ "type": "DELAY", "order": 0, "delayMinutes": 30 }]
        })
        .to_string()
    }

    fn request_body(request: &str) -> Value {
        let (_, body) = request.split_once("\r\n\r\n").unwrap();
        serde_json::from_str(body).unwrap()
    }

    #[tokio::test]
    async fn test_create_posts_payload() {
        let (store, server) = serve_once("201 Created", stored("wf-9")).await;
        let model = store.create(&payload()).await.unwrap();
        assert_eq!(model.id, "wf-9");
        assert_eq!(model.steps.len(), 1);
        assert_eq!(model.steps[0].step_type, StepType::Delay);
        assert_eq!(model.steps[0].delay_minutes, Some(30));
        assert_eq!(model.definition.len(), 2);

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /api/workflows HTTP/1.1\r\n"), "{}", request);
        let body = request_body(&request);
        assert_eq!(body["triggerType"], "APPOINTMENT_CREATED");
        assert_eq!(body["audience"], "NEW");
        assert_eq!(body["steps"].as_array().unwrap().len(), 4);
        assert_eq!(body["definition"][0]["kind"], "trigger");
    }

    #[tokio::test]
    async fn test_update_puts_to_document() {
        let (store, server) = serve_once("200 OK", stored("wf-9")).await;
        let model = store.update("wf-9", &payload()).await.unwrap();
        assert_eq!(model.id, "wf-9");

        let request = server.await.unwrap();
        assert!(request.starts_with("PUT /api/workflows/wf-9 HTTP/1.1\r\n"), "{}", request);
        assert_eq!(request_body(&request)["name"], "Booking");
    }

    #[tokio::test]
    async fn test_list_gets_collection() {
        let (store, server) = serve_once("200 OK", format!("[{}]", stored("wf-1"))).await;
        let models = store.list().await.unwrap();
        assert_eq!(models.len(), 1);
        assert_eq!(models[0].id, "wf-1");
        assert!(server.await.unwrap().starts_with("GET /api/workflows HTTP/1.1\r\n"));
    }

    #[tokio::test]
    async fn test_non_success_status_is_persistence_error() {
        let (store, server) = serve_once("422 Unprocessable Entity", r#"{"error":"bad definition"}"#.to_string()).await;
        match store.create(&payload()).await {
            Err(CareflowError::Persistence(message)) => {
                assert!(message.contains("422"), "{}", message);
                assert!(message.contains("bad definition"), "{}", message);
            }
            other => panic!("expected persistence error, got {:?}", other),
        }
        server.await.unwrap();

        let (store, server) = serve_once("404 Not Found", String::new()).await;
        match store.update("missing", &payload()).await {
            Err(CareflowError::Persistence(message)) => assert!(message.contains("404"), "{}", message),
            other => panic!("expected persistence error, got {:?}", other),
        }
        assert!(server.await.unwrap().starts_with("PUT /api/workflows/missing "));
    }
}
