use crate::{
    config::{DatabaseConfig, ServerConfig},
    error::{Error, StoreError},
    log::{DEVELOPMENT, RECORDS},
    tls,
};
use std::future::Future;
use std::time::Duration;
use tokio::{net::TcpListener, time};
use tokio_postgres::{Client, NoTls};
use tracing::{debug, error, info};

const MAX_RETRY_DELAY: Duration = Duration::from_secs(2);
const MAX_RETRY_COUNT: u32 = 3;

///
/// Connect to the record database.
/// The connection task is spawned and runs until the client is dropped.
///
pub async fn database(config: &DatabaseConfig) -> Result<Client, Error> {
    let connection_string = config.to_connection_string()?;
    let timeout = config.connection_timeout();

    debug!(target: RECORDS, msg = "Connecting to database", database = %config, tls = config.with_tls);

    let connected = if config.with_tls {
        let tls_config = tls::configure_client(config);
        let tls = tokio_postgres_rustls::MakeRustlsConnect::new(tls_config);

        time::timeout(timeout, tokio_postgres::connect(&connection_string, tls))
            .await
            .map_err(StoreError::from)?
            .map(|(client, connection)| {
                spawn_connection(connection);
                client
            })
    } else {
        time::timeout(timeout, tokio_postgres::connect(&connection_string, NoTls))
            .await
            .map_err(StoreError::from)?
            .map(|(client, connection)| {
                spawn_connection(connection);
                client
            })
    };

    connected.map_err(|err| {
        error!(
            msg = "Could not connect to database",
            database = %config,
            error = err.to_string()
        );
        error!(msg = "Confirm that the database configuration is correct");
        Error::from(err)
    })
}

fn spawn_connection<C>(connection: C)
where
    C: Future<Output = Result<(), tokio_postgres::Error>> + Send + 'static,
{
    tokio::spawn(async move {
        if let Err(err) = connection.await {
            error!(msg = "Database connection error", error = err.to_string());
        }
    });
}

pub async fn bind_with_retry(server: &ServerConfig) -> Result<TcpListener, Error> {
    let address = &server.to_socket_address();
    let mut retry_count = 0;

    loop {
        match TcpListener::bind(address).await {
            Ok(listener) => {
                info!(msg = "Server waiting for connections", address);
                return Ok(listener);
            }
            Err(err) => {
                if retry_count > MAX_RETRY_COUNT {
                    error!(
                        msg = "Error binding connection",
                        retries = MAX_RETRY_COUNT,
                        error = err.to_string()
                    );
                    return Err(err.into());
                }
                debug!(target: DEVELOPMENT, msg = "Retrying bind", address, retry_count);
            }
        };
        let sleep_duration_ms =
            (100 * 2_u64.pow(retry_count)).min(MAX_RETRY_DELAY.as_millis() as _);
        time::sleep(Duration::from_millis(sleep_duration_ms)).await;

        retry_count += 1;
    }
}
