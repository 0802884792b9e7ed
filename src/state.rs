use std::collections::HashMap;

use raycast_vehicle::{DriveSignal, WheelPoseSnapshot};
use serde::Serialize;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, warn};

use crate::physics::PhysicsWorld;

#[derive(Debug, Clone, Serialize)]
pub struct ChassisSnapshot {
    pub position: [f32; 3],
    pub rotation: [f32; 4], // quaternion [i, j, k, w]
    pub linvel: [f32; 3],
}

#[derive(Debug, Clone, Serialize)]
pub struct PlayerSnapshot {
    pub id: String,
    pub chassis: ChassisSnapshot,
    pub wheels: Vec<WheelPoseSnapshot>,
    pub speed: f32,          // m/s along chassis forward
    pub signal: DriveSignal, // brake lights / reverse lights
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename = "snapshot")]
pub struct Snapshot {
    pub tick: u64,
    pub players: Vec<PlayerSnapshot>,
}

pub struct SharedGameState {
    pub tick: u64,
    pub clients: HashMap<String, UnboundedSender<String>>, // playerId → outgoing queue
}

impl SharedGameState {
    pub fn new() -> Self {
        Self {
            tick: 0,
            clients: HashMap::new(),
        }
    }

    pub fn register_client(&mut self, id: &str, tx: UnboundedSender<String>) {
        self.clients.insert(id.to_string(), tx);
        debug!(player = id, clients = self.clients.len(), "client registered");
    }

    pub fn remove_client(&mut self, id: &str) {
        self.clients.remove(id);
    }

    /// Build and send a snapshot of all cars to all clients.
    pub fn broadcast_snapshot(&self, physics: &PhysicsWorld) {
        let snapshot = Snapshot {
            tick: self.tick,
            players: snapshot_players(physics),
        };

        let json = match serde_json::to_string(&snapshot) {
            Ok(json) => json,
            Err(err) => {
                warn!(%err, "failed to encode snapshot");
                return;
            }
        };

        for tx in self.clients.values() {
            let _ = tx.send(json.clone());
        }
    }
}

pub fn snapshot_players(physics: &PhysicsWorld) -> Vec<PlayerSnapshot> {
    let mut players = Vec::with_capacity(physics.cars.len());

    for (id, car) in &physics.cars {
        let Some(body) = physics.bodies.get(car.body) else {
            continue;
        };

        let iso = body.position();
        let pos = iso.translation.vector;
        let rot = iso.rotation;
        let vel = body.linvel();

        players.push(PlayerSnapshot {
            id: id.clone(),
            chassis: ChassisSnapshot {
                position: [pos.x, pos.y, pos.z],
                rotation: [rot.i, rot.j, rot.k, rot.w],
                linvel: [vel.x, vel.y, vel.z],
            },
            wheels: car
                .vehicle
                .wheel_poses_at(iso)
                .iter()
                .map(|pose| pose.snapshot())
                .collect(),
            speed: car.vehicle.current_speed(),
            signal: car.vehicle.drive_signal(),
        });
    }

    players.sort_by(|a, b| a.id.cmp(&b.id));
    players
}

#[cfg(test)]
mod tests {
    use super::*;
    use raycast_vehicle::VehicleConfig;
    use raycast_vehicle::pose::local_transform;
    use rapier3d::prelude::vector;
    use rapier3d::na as nalgebra;

    #[test]
    fn wheels_follow_the_stepped_chassis() {
        let mut physics = PhysicsWorld::new(VehicleConfig::sedan());
        let body = physics.spawn_car("p1", 0.0, 0.0).unwrap();
        for _ in 0..120 {
            physics.step(1.0 / 60.0);
        }

        physics.bodies[body].set_linvel(vector![0.0, 0.0, 20.0], true);
        physics.step(1.0 / 60.0);

        let players = snapshot_players(&physics);
        let chassis = *physics.bodies[body].position();
        let car = &physics.cars["p1"];

        for (wheel, snap) in car.vehicle.wheels().iter().zip(&players[0].wheels) {
            let expected = (chassis * local_transform(wheel)).translation.vector;
            for axis in 0..3 {
                assert!(
                    (snap.position[axis] - expected[axis]).abs() < 1e-4,
                    "wheel off by {} m on axis {axis}",
                    snap.position[axis] - expected[axis]
                );
            }
        }
        assert_eq!(players[0].chassis.position[2], chassis.translation.vector.z);
    }

    #[test]
    fn snapshot_carries_every_wheel() {
        let mut physics = PhysicsWorld::new(VehicleConfig::sedan());
        physics.spawn_car("b", 3.0, 0.0).unwrap();
        physics.spawn_car("a", -3.0, 0.0).unwrap();
        physics.step(1.0 / 60.0);

        let players = snapshot_players(&physics);
        assert_eq!(players.len(), 2);
        assert_eq!(players[0].id, "a");
        assert_eq!(players[0].wheels.len(), 4);
        assert_eq!(players[0].signal, DriveSignal::Idle);

        let json = serde_json::to_value(Snapshot { tick: 7, players }).unwrap();
        assert_eq!(json["type"], "snapshot");
        assert_eq!(json["tick"], 7);
        assert_eq!(json["players"][1]["signal"], "idle");
    }
}
