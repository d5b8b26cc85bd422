//! Socket establishment.
//!
//! Resolves the server, honors family/binding options, applies the
//! connect timeout, enables TCP keepalive, and optionally wraps the
//! stream in TLS. The `self_signed` / `cert_expired` options tolerate
//! exactly the matching certificate errors; every other authorization
//! failure still fails the connect.

use std::net::SocketAddr;

use socket2::{SockRef, TcpKeepalive};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpSocket, TcpStream};
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::config::{AddrFamily, Config};
use crate::error::{ProtocolError, Result};

/// Object-safe bound for anything the client can speak IRC over.
///
/// An engine only needs an ordered byte stream; embedders may hand in
/// their own pre-connected socket via [`crate::client::Client::attach`].
pub trait IrcStream: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T: AsyncRead + AsyncWrite + Unpin + Send> IrcStream for T {}

/// Open a stream to the configured server, TLS-wrapped when requested.
pub(crate) async fn open(cfg: &Config) -> Result<Box<dyn IrcStream>> {
    let tcp = open_tcp(cfg).await?;

    if let Err(e) = enable_keepalive(&tcp) {
        warn!("failed to enable TCP keepalive: {}", e);
    }

    if cfg.secure {
        #[cfg(feature = "tls")]
        {
            let tls = tls::wrap(cfg, tcp).await?;
            return Ok(Box::new(tls));
        }
        #[cfg(not(feature = "tls"))]
        {
            return Err(ProtocolError::Tls(
                "secure requested but the tls feature is disabled".to_owned(),
            ));
        }
    }

    Ok(Box::new(tcp))
}

async fn open_tcp(cfg: &Config) -> Result<TcpStream> {
    let mut addrs: Vec<SocketAddr> =
        tokio::net::lookup_host((cfg.server.as_str(), cfg.port))
            .await?
            .filter(|addr| match cfg.family {
                AddrFamily::Any => true,
                AddrFamily::V4 => addr.is_ipv4(),
                AddrFamily::V6 => addr.is_ipv6(),
            })
            .collect();

    if addrs.is_empty() {
        return Err(ProtocolError::NoAddress(cfg.server.clone()));
    }

    if cfg.bust_rfc3484 {
        // Spread load across round-robin DNS instead of letting address
        // selection always pick the same record.
        use rand::seq::SliceRandom;
        addrs.shuffle(&mut rand::thread_rng());
    }

    let mut last_err: Option<std::io::Error> = None;
    for addr in addrs {
        match timeout(cfg.connection_timeout, dial(cfg, addr)).await {
            Ok(Ok(stream)) => {
                debug!(%addr, "connected");
                return Ok(stream);
            }
            Ok(Err(e)) => {
                debug!(%addr, error = %e, "connect failed");
                last_err = Some(e);
            }
            Err(_) => return Err(ProtocolError::ConnectTimeout(cfg.connection_timeout)),
        }
    }

    Err(last_err
        .map(ProtocolError::Io)
        .unwrap_or_else(|| ProtocolError::NoAddress(cfg.server.clone())))
}

async fn dial(cfg: &Config, addr: SocketAddr) -> std::io::Result<TcpStream> {
    let socket = if addr.is_ipv4() {
        TcpSocket::new_v4()?
    } else {
        TcpSocket::new_v6()?
    };

    if cfg.local_address.is_some() || cfg.local_port.is_some() {
        let ip = cfg.local_address.unwrap_or(if addr.is_ipv4() {
            std::net::Ipv4Addr::UNSPECIFIED.into()
        } else {
            std::net::Ipv6Addr::UNSPECIFIED.into()
        });
        socket.bind(SocketAddr::new(ip, cfg.local_port.unwrap_or(0)))?;
    }

    socket.connect(addr).await
}

fn enable_keepalive(stream: &TcpStream) -> std::io::Result<()> {
    use std::time::Duration;

    let sock = SockRef::from(stream);
    let keepalive = TcpKeepalive::new()
        .with_time(Duration::from_secs(120))
        .with_interval(Duration::from_secs(30));

    sock.set_tcp_keepalive(&keepalive)
}

#[cfg(feature = "tls")]
mod tls {
    use std::sync::Arc;

    use tokio::net::TcpStream;
    use tokio_rustls::client::TlsStream;
    use tokio_rustls::rustls::client::danger::{
        HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier,
    };
    use tokio_rustls::rustls::client::WebPkiServerVerifier;
    use tokio_rustls::rustls::pki_types::{CertificateDer, ServerName, UnixTime};
    use tokio_rustls::rustls::{
        CertificateError, ClientConfig, DigitallySignedStruct, Error as TlsError, RootCertStore,
        SignatureScheme,
    };
    use tokio_rustls::TlsConnector;

    use crate::config::Config;
    use crate::error::{ProtocolError, Result};

    pub(super) async fn wrap(cfg: &Config, tcp: TcpStream) -> Result<TlsStream<TcpStream>> {
        let mut roots = RootCertStore::empty();
        roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

        let verifier = WebPkiServerVerifier::builder(Arc::new(roots))
            .build()
            .map_err(|e| ProtocolError::Tls(e.to_string()))?;

        let client_config = if cfg.self_signed || cfg.cert_expired {
            ClientConfig::builder()
                .dangerous()
                .with_custom_certificate_verifier(Arc::new(TolerantVerifier {
                    inner: verifier,
                    self_signed: cfg.self_signed,
                    cert_expired: cfg.cert_expired,
                }))
                .with_no_client_auth()
        } else {
            ClientConfig::builder()
                .with_webpki_verifier(verifier)
                .with_no_client_auth()
        };

        let server_name = ServerName::try_from(cfg.server.clone())
            .map_err(|e| ProtocolError::Tls(e.to_string()))?;

        TlsConnector::from(Arc::new(client_config))
            .connect(server_name, tcp)
            .await
            .map_err(|e| ProtocolError::Tls(e.to_string()))
    }

    /// Verifier that accepts the configured certificate defects and
    /// nothing else.
    #[derive(Debug)]
    struct TolerantVerifier {
        inner: Arc<WebPkiServerVerifier>,
        self_signed: bool,
        cert_expired: bool,
    }

    impl ServerCertVerifier for TolerantVerifier {
        fn verify_server_cert(
            &self,
            end_entity: &CertificateDer<'_>,
            intermediates: &[CertificateDer<'_>],
            server_name: &ServerName<'_>,
            ocsp_response: &[u8],
            now: UnixTime,
        ) -> std::result::Result<ServerCertVerified, TlsError> {
            match self.inner.verify_server_cert(
                end_entity,
                intermediates,
                server_name,
                ocsp_response,
                now,
            ) {
                Ok(verified) => Ok(verified),
                Err(TlsError::InvalidCertificate(cert_err)) => {
                    let tolerated = match cert_err {
                        CertificateError::Expired | CertificateError::NotValidYet => {
                            self.cert_expired
                        }
                        CertificateError::UnknownIssuer | CertificateError::BadSignature => {
                            self.self_signed
                        }
                        _ => false,
                    };
                    if tolerated {
                        Ok(ServerCertVerified::assertion())
                    } else {
                        Err(TlsError::InvalidCertificate(cert_err))
                    }
                }
                Err(e) => Err(e),
            }
        }

        fn verify_tls12_signature(
            &self,
            message: &[u8],
            cert: &CertificateDer<'_>,
            dss: &DigitallySignedStruct,
        ) -> std::result::Result<HandshakeSignatureValid, TlsError> {
            self.inner.verify_tls12_signature(message, cert, dss)
        }

        fn verify_tls13_signature(
            &self,
            message: &[u8],
            cert: &CertificateDer<'_>,
            dss: &DigitallySignedStruct,
        ) -> std::result::Result<HandshakeSignatureValid, TlsError> {
            self.inner.verify_tls13_signature(message, cert, dss)
        }

        fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
            self.inner.supported_verify_schemes()
        }
    }
}
