//! End-to-end tests: a real dealer and real players on loopback.
//!
//! The dealer broadcasts its Offer straight at the player's discovery socket,
//! so the full path (discovery, join, rounds, results) runs exactly as it
//! would on a LAN.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use bj_dealer::infrastructure::network::server::DealerServer;
use bj_dealer::infrastructure::storage::config::DealerConfig;
use bj_player::application::{PlayerError, PlayerSession, ThresholdStrategy};
use bj_player::infrastructure::network::dealer_conn::DealerConnection;
use bj_player::infrastructure::network::discovery::OfferListener;
use tokio::task::JoinHandle;
use tokio::time::timeout;

const STEP: Duration = Duration::from_secs(10);

/// Starts a dealer whose Offers go to `discovery_port` on loopback.
async fn start_dealer(
    discovery_port: u16,
    name: &str,
) -> (Arc<AtomicBool>, JoinHandle<anyhow::Result<()>>) {
    let mut config = DealerConfig::default();
    config.dealer.server_name = name.to_string();
    config.dealer.round_pause_ms = 0;
    config.dealer.shuffle_seed = Some(2024);
    config.network.bind_address = "127.0.0.1".parse().unwrap();
    config.network.broadcast_address = "127.0.0.1".parse().unwrap();
    config.network.discovery_port = discovery_port;
    config.network.broadcast_interval_ms = 50;

    let server = DealerServer::bind(config).await.unwrap();
    let running = Arc::new(AtomicBool::new(true));
    let handle = tokio::spawn(server.run(Arc::clone(&running)));
    (running, handle)
}

#[tokio::test]
async fn test_discover_join_and_play_all_rounds() {
    // Arrange
    let listener = OfferListener::bind(0).await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let (running, dealer_task) = start_dealer(port, "E2E Table").await;

    // Act
    let dealer = timeout(STEP, listener.next_offer())
        .await
        .expect("offer arrives")
        .unwrap();
    let mut conn = DealerConnection::connect(dealer.addr, STEP).await.unwrap();
    conn.send_request(5, "Robots").await.unwrap();
    let stats = timeout(
        STEP,
        PlayerSession::new(conn, ThresholdStrategy::default()).play(5),
    )
    .await
    .expect("rounds finish")
    .unwrap();

    // Assert
    assert_eq!(dealer.server_name, "E2E Table");
    assert_eq!(stats.rounds_played(), 5);
    assert_eq!(stats.wins + stats.losses + stats.ties, 5);

    running.store(false, Ordering::SeqCst);
    timeout(STEP, dealer_task).await.unwrap().unwrap().unwrap();
}

#[tokio::test]
async fn test_two_players_are_served_independently() {
    // Arrange
    let listener = OfferListener::bind(0).await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let (running, dealer_task) = start_dealer(port, "Busy Table").await;
    let dealer = timeout(STEP, listener.next_offer()).await.unwrap().unwrap();

    // Act: a cautious player and a greedy one at the same time.
    let play = |rounds: u8, threshold: u32| {
        let addr = dealer.addr;
        tokio::spawn(async move {
            let mut conn = DealerConnection::connect(addr, STEP).await?;
            conn.send_request(rounds, "Twin").await?;
            PlayerSession::new(conn, ThresholdStrategy::new(threshold))
                .play(rounds)
                .await
        })
    };
    let cautious = play(3, 12);
    let greedy = play(4, 20);

    // Assert
    let cautious: Result<_, PlayerError> = timeout(STEP, cautious).await.unwrap().unwrap();
    let greedy: Result<_, PlayerError> = timeout(STEP, greedy).await.unwrap().unwrap();
    assert_eq!(cautious.unwrap().rounds_played(), 3);
    assert_eq!(greedy.unwrap().rounds_played(), 4);

    running.store(false, Ordering::SeqCst);
    timeout(STEP, dealer_task).await.unwrap().unwrap().unwrap();
}

#[tokio::test]
async fn test_player_sees_disconnect_when_dealer_drops_mid_session() {
    // Arrange: a fake dealer that sends one card and hangs up.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let fake = tokio::spawn(async move {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        let (mut stream, _) = listener.accept().await.unwrap();
        let mut request = [0u8; bj_core::protocol::messages::REQUEST_SIZE];
        stream.read_exact(&mut request).await.unwrap();
        let card = bj_core::Card::new(bj_core::Suit::Spades, 7).unwrap();
        stream
            .write_all(&bj_core::protocol::encode_card_payload(&card))
            .await
            .unwrap();
    });

    // Act
    let mut conn = DealerConnection::connect(addr, STEP).await.unwrap();
    conn.send_request(2, "Stranded").await.unwrap();
    let mut session = PlayerSession::new(conn, ThresholdStrategy::default());
    let err = timeout(STEP, session.play(2)).await.unwrap().unwrap_err();

    // Assert
    assert!(matches!(err, PlayerError::Disconnected));
    assert_eq!(session.stats().rounds_played(), 0);
    fake.await.unwrap();
}
