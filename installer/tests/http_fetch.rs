//! Integration tests for `HttpFetcher` against a local HTTP server.
//!
//! The server answers HEAD and GET for a handful of fixed routes so filename
//! resolution and status mapping can be observed end to end.

use recipe_installer::artefact::download::{FetchError, Fetcher, HttpFetcher};
use rstest::{fixture, rstest};
use std::sync::Arc;
use std::thread::JoinHandle;
use tiny_http::{Header, Response, Server};

const BODY: &[u8] = b"archive bytes";

struct TestServer {
    server: Arc<Server>,
    base: String,
    handle: Option<JoinHandle<()>>,
}

impl TestServer {
    fn start() -> Self {
        let server = Arc::new(Server::http("127.0.0.1:0").expect("bind test server"));
        let addr = server
            .server_addr()
            .to_ip()
            .expect("test server listens on TCP");
        let worker = Arc::clone(&server);
        let handle = std::thread::spawn(move || {
            for request in worker.incoming_requests() {
                let response = route(request.url());
                if request.respond(response).is_err() {
                    break;
                }
            }
        });
        Self {
            server,
            base: format!("http://{addr}"),
            handle: Some(handle),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.server.unblock();
        if let Some(handle) = self.handle.take() {
            drop(handle.join());
        }
    }
}

fn route(path: &str) -> Response<std::io::Cursor<Vec<u8>>> {
    match path {
        "/download?id=7" => Response::from_data(BODY.to_vec()).with_header(
            Header::from_bytes(
                &b"Content-Disposition"[..],
                &b"attachment; filename=\"zlib-1.3.tar.gz\""[..],
            )
            .expect("valid header"),
        ),
        "/files/fmt-10.2.1.zip" | "/" => Response::from_data(BODY.to_vec()),
        "/forbidden.tar.gz" => Response::from_data(b"denied".to_vec()).with_status_code(403),
        _ => Response::from_data(b"not found".to_vec()).with_status_code(404),
    }
}

#[fixture]
fn server() -> TestServer {
    TestServer::start()
}

#[fixture]
fn fetcher() -> HttpFetcher {
    HttpFetcher::default()
}

#[rstest]
fn content_disposition_names_the_download(server: TestServer, fetcher: HttpFetcher) {
    let artifact = fetcher
        .fetch(&server.url("/download?id=7"), None)
        .expect("download succeeds");

    assert_eq!(artifact.file_name(), "zlib-1.3.tar.gz");
    assert_eq!(std::fs::read(artifact.path()).expect("read download"), BODY);
}

#[rstest]
fn url_path_names_the_download_without_header(server: TestServer, fetcher: HttpFetcher) {
    let artifact = fetcher
        .fetch(&server.url("/files/fmt-10.2.1.zip"), None)
        .expect("download succeeds");

    assert_eq!(artifact.file_name(), "fmt-10.2.1.zip");
}

#[rstest]
fn explicit_filename_wins_over_header(server: TestServer, fetcher: HttpFetcher) {
    let artifact = fetcher
        .fetch(&server.url("/download?id=7"), Some("custom.tgz"))
        .expect("download succeeds");

    assert_eq!(artifact.file_name(), "custom.tgz");
}

#[rstest]
fn missing_source_maps_to_not_found(server: TestServer, fetcher: HttpFetcher) {
    let err = fetcher
        .fetch(&server.url("/gone.tar.gz"), None)
        .expect_err("404 fails");

    assert!(matches!(err, FetchError::NotFound { .. }), "got {err:?}");
}

#[rstest]
fn other_statuses_are_reported(server: TestServer, fetcher: HttpFetcher) {
    let err = fetcher
        .fetch(&server.url("/forbidden.tar.gz"), None)
        .expect_err("403 fails");

    assert!(matches!(err, FetchError::Status { status: 403, .. }), "got {err:?}");
}

#[rstest]
fn unnamed_source_is_rejected(server: TestServer, fetcher: HttpFetcher) {
    let err = fetcher
        .fetch(&server.url("/"), None)
        .expect_err("no filename");

    assert!(matches!(err, FetchError::InvalidSource { .. }), "got {err:?}");
}

#[rstest]
fn download_directory_is_removed_on_discard(server: TestServer, fetcher: HttpFetcher) {
    let artifact = fetcher
        .fetch(&server.url("/files/fmt-10.2.1.zip"), None)
        .expect("download succeeds");
    let dir = artifact.dir().to_path_buf();

    artifact.discard().expect("discard");

    assert!(!dir.exists());
}
