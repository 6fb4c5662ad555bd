use framelink::client::InstanceClient;
use framelink::config::ServerConfig;
use framelink::controller::{ControllerInputs, ControllerSlot, ControllerSnapshot};
use framelink::discovery::{self, ServerAddressRecord};
use framelink::frame::{manual_clock, FrameTrigger};
use framelink::host::SimulatedHost;
use framelink::server::{Instance, ServerError};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio::task::JoinHandle;

const BASE: u32 = 0x8000_0000;

struct Running {
    client: InstanceClient,
    record: ServerAddressRecord,
    host: Arc<SimulatedHost>,
    snapshots: watch::Receiver<ControllerSnapshot>,
    trigger: FrameTrigger,
    task: JoinHandle<Result<(), ServerError>>,
    dir: tempfile::TempDir,
}

impl Running {
    /// Signals one frame and waits until the applier has published it
    async fn frame(&mut self) -> ControllerSnapshot {
        assert!(self.trigger.tick());
        self.snapshots.changed().await.unwrap();
        self.snapshots.borrow_and_update().clone()
    }

    async fn shutdown(self) {
        drop(self.trigger);
        self.task.await.unwrap().unwrap();
    }
}

async fn start(watch_list: &str) -> Running {
    let dir = tempfile::tempdir().unwrap();
    let watch_list_path = dir.path().join("watch_list.csv");
    tokio::fs::write(&watch_list_path, watch_list).await.unwrap();

    let config = ServerConfig {
        watch_list_path,
        discovery_file: Some(dir.path().join("instances.txt")),
        ..ServerConfig::default()
    };

    let host = Arc::new(SimulatedHost::new(BASE, 0x1000));
    let instance = Instance::bind(config, host.clone()).await.unwrap();
    let record = instance.address_record();
    let snapshots = instance.subscribe();
    let (trigger, clock) = manual_clock();
    let task = tokio::spawn(instance.run(clock));

    Running {
        client: InstanceClient::new(record.host.clone(), record.port),
        record,
        host,
        snapshots,
        trigger,
        task,
        dir,
    }
}

fn discovery_path(running: &Running) -> PathBuf {
    running.dir.path().join("instances.txt")
}

fn slot(index: u8) -> ControllerSlot {
    ControllerSlot::try_from(index).unwrap()
}

#[tokio::test]
async fn held_input_stays_applied_until_replaced() {
    let mut running = start("name,type,address,description\n").await;

    let inputs = ControllerInputs {
        id: 2,
        a: true,
        ..Default::default()
    };
    running.client.send_inputs(&inputs).await.unwrap();

    let first = running.frame().await;
    assert!(first.slot(slot(2)).a);
    assert!(running.host.controller(slot(2)).a);
    assert_eq!(first.backlog, 0);

    let second = running.frame().await;
    assert_eq!(second.frame, first.frame + 1);
    assert!(second.slot(slot(2)).a);
    assert!(running.host.controller(slot(2)).a);

    // the other ports keep their neutral state
    for index in [0, 1, 3] {
        assert_eq!(
            *second.slot(slot(index)),
            ControllerInputs::neutral(slot(index))
        );
    }

    running.shutdown().await;
}

#[tokio::test]
async fn updates_from_several_connections_apply_one_per_frame_in_order() {
    let mut running = start("name,type,address,description\n").await;
    let other = running.client.clone();

    for stick_x in [10, 20, 30] {
        let inputs = ControllerInputs {
            id: 0,
            stick_x,
            ..Default::default()
        };
        // alternate between two clients, each call is its own connection
        if stick_x == 20 {
            other.send_inputs(&inputs).await.unwrap();
        } else {
            running.client.send_inputs(&inputs).await.unwrap();
        }
    }

    let mut seen = Vec::new();
    for _ in 0..4 {
        let snapshot = running.frame().await;
        seen.push((snapshot.slot(slot(0)).stick_x, snapshot.backlog));
    }
    assert_eq!(seen, vec![(10, 2), (20, 1), (30, 0), (30, 0)]);

    running.shutdown().await;
}

#[tokio::test]
async fn samples_watched_memory() {
    let running = start(
        "name,type,address,description\n\
         stocks,u8,0x80000010,remaining stocks\n\
         timer,u32,0x80000020,frames left\n\
         speed,f32,0x80000030,horizontal speed\n",
    )
    .await;
    running.host.write_u8(BASE + 0x10, 3).unwrap();
    running.host.write_u32(BASE + 0x20, 28_800).unwrap();
    running.host.write_f32(BASE + 0x30, 1.5).unwrap();

    let values = running.client.get_watch_list_values().await.unwrap();
    assert_eq!(values.len(), 3);
    assert_eq!(values["stocks"].as_f64(), 3.0);
    assert_eq!(values["timer"].as_f64(), 28_800.0);
    assert_eq!(values["speed"].as_f64(), 1.5);

    running.shutdown().await;
}

#[tokio::test]
async fn unreadable_watch_entry_empties_the_sample() {
    let running = start(
        "name,type,address,description\n\
         stocks,u8,0x80000010,\n\
         outside,u32,0x10,not mapped\n",
    )
    .await;

    let values = running.client.get_watch_list_values().await.unwrap();
    assert!(values.is_empty());

    running.shutdown().await;
}

#[tokio::test]
async fn non_finite_float_empties_the_sample() {
    let running = start(
        "name,type,address,description\n\
         stocks,u8,0x80000010,\n\
         speed,f32,0x80000030,horizontal speed\n",
    )
    .await;
    running.host.write_u8(BASE + 0x10, 3).unwrap();
    running.host.write_f32(BASE + 0x30, f32::NAN).unwrap();

    let values = running.client.get_watch_list_values().await.unwrap();
    assert!(values.is_empty());

    running.host.write_f32(BASE + 0x30, 2.0).unwrap();
    let values = running.client.get_watch_list_values().await.unwrap();
    assert_eq!(values.len(), 2);
    assert_eq!(values["speed"].as_f64(), 2.0);

    running.shutdown().await;
}

#[tokio::test]
async fn unknown_action_keeps_connection_usable() {
    let running = start("name,type,address,description\n").await;
    let mut stream = TcpStream::connect(running.client.addr()).await.unwrap();
    let mut buffer = vec![0u8; 1024];

    stream.write_all(br#"{"action":"fly"}"#).await.unwrap();
    let read = stream.read(&mut buffer).await.unwrap();
    assert_eq!(
        &buffer[..read],
        br#"{"status":"error","message":"Invalid action : fly"}"#
    );

    stream.write_all(br#"{"action":"say_hello"}"#).await.unwrap();
    let read = stream.read(&mut buffer).await.unwrap();
    assert_eq!(&buffer[..read], br#"{"status":"ok","message":"Hello"}"#);

    running.shutdown().await;
}

#[tokio::test]
async fn hello_has_no_side_effects() {
    let mut running = start("name,type,address,description\n").await;

    assert_eq!(running.client.say_hello().await.unwrap(), "Hello");
    let snapshot = running.frame().await;
    assert_eq!(snapshot.backlog, 0);
    assert_eq!(snapshot.slots, ControllerSnapshot::default().slots);

    running.shutdown().await;
}

#[tokio::test]
async fn save_state_and_reset_reach_the_host() {
    let running = start(
        "name,type,address,description\n\
         stocks,u8,0x80000010,\n",
    )
    .await;
    running.host.write_u8(BASE + 0x10, 4).unwrap();
    running.host.save_to_slot(1);
    running.host.write_u8(BASE + 0x10, 1).unwrap();

    running.client.load_save_state_from_slot(1).await.unwrap();
    let values = running.client.get_watch_list_values().await.unwrap();
    assert_eq!(values["stocks"].as_f64(), 4.0);

    running.client.reset().await.unwrap();
    let values = running.client.get_watch_list_values().await.unwrap();
    assert_eq!(values["stocks"].as_f64(), 0.0);

    running.shutdown().await;
}

#[tokio::test]
async fn publishes_bound_address() {
    let running = start("name,type,address,description\n").await;
    // any answered request means the address was published before serving
    running.client.say_hello().await.unwrap();

    let records = discovery::read_records(&discovery_path(&running))
        .await
        .unwrap();
    assert_eq!(records, vec![running.record.clone()]);

    let clients = framelink::client::discover(&discovery_path(&running))
        .await
        .unwrap();
    assert_eq!(clients, vec![running.client.clone()]);

    running.shutdown().await;
}
