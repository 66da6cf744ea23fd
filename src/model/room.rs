// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Rooms and the spatial connections between them.
//!
//! Rooms live in an arena ([`RoomGraph`]) and are addressed by
//! [`RoomIndex`]. Indices stay valid after other rooms are removed.
//! Connections are directed edges kept in mirrored pairs: `A → B` on the
//! left always comes with `B → A` on the right.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::types::GroupId;

/// Position of a room in a [`RoomGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomIndex(usize);

impl RoomIndex {
    /// Returns the raw arena slot.
    #[must_use]
    pub const fn get(&self) -> usize {
        self.0
    }
}

impl fmt::Display for RoomIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What separates two connected rooms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionKind {
    /// A solid wall.
    Wall,
    /// A door.
    Door,
    /// No separation.
    OpenSpace,
    /// A counter or half-height wall.
    HalfWall,
}

/// Which side of a room a connection is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    /// Left.
    Left,
    /// Right.
    Right,
    /// Top.
    Top,
    /// Bottom.
    Bottom,
}

impl Side {
    /// Returns the side as seen from the other room.
    #[must_use]
    pub const fn mirrored(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
            Self::Top => Self::Bottom,
            Self::Bottom => Self::Top,
        }
    }
}

/// A room. Its members live in the backing [`Group`](crate::model::Group).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    /// Display name.
    pub name: String,
    /// Room type, e.g. "Kitchen".
    pub room_type: String,
    /// Number of windows.
    pub windows: u16,
    /// Number of doors to the outside.
    pub outside_doors: u16,
    /// Number of skylights.
    pub skylights: u16,
    /// The group holding the room's devices.
    pub group: GroupId,
}

impl Room {
    /// Creates a room backed by a group.
    #[must_use]
    pub fn new(name: impl Into<String>, room_type: impl Into<String>, group: GroupId) -> Self {
        Self {
            name: name.into(),
            room_type: room_type.into(),
            windows: 0,
            outside_doors: 0,
            skylights: 0,
            group,
        }
    }
}

/// A directed edge between two rooms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoomConnection {
    /// Room the edge starts from.
    pub from: RoomIndex,
    /// Room the edge leads to.
    pub to: RoomIndex,
    /// What separates the rooms.
    pub kind: ConnectionKind,
    /// Side of `from` the connection is on.
    pub side: Side,
}

/// Arena of rooms plus their connection edges.
///
/// # Examples
///
/// ```
/// use homelink::model::{ConnectionKind, Room, RoomGraph, Side};
/// use homelink::types::GroupId;
///
/// let mut graph = RoomGraph::default();
/// let kitchen = graph.add_room(Room::new("Kitchen", "Kitchen", GroupId::new()));
/// let hall = graph.add_room(Room::new("Hall", "Hallway", GroupId::new()));
///
/// graph.add_connection(kitchen, hall, ConnectionKind::Door, Side::Left).unwrap();
///
/// let back = graph.connections_on(hall, Side::Right);
/// assert_eq!(back.len(), 1);
/// assert_eq!(back[0].to, kitchen);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomGraph {
    rooms: Vec<Option<Room>>,
    edges: Vec<RoomConnection>,
}

impl RoomGraph {
    /// Adds a room and returns its index.
    pub fn add_room(&mut self, room: Room) -> RoomIndex {
        self.rooms.push(Some(room));
        RoomIndex(self.rooms.len() - 1)
    }

    /// Returns a room.
    #[must_use]
    pub fn room(&self, index: RoomIndex) -> Option<&Room> {
        self.rooms.get(index.0).and_then(Option::as_ref)
    }

    /// Returns a room mutably.
    pub fn room_mut(&mut self, index: RoomIndex) -> Option<&mut Room> {
        self.rooms.get_mut(index.0).and_then(Option::as_mut)
    }

    /// Iterates over live rooms.
    pub fn rooms(&self) -> impl Iterator<Item = (RoomIndex, &Room)> {
        self.rooms
            .iter()
            .enumerate()
            .filter_map(|(i, r)| r.as_ref().map(|r| (RoomIndex(i), r)))
    }

    /// Returns the number of live rooms.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rooms.iter().filter(|r| r.is_some()).count()
    }

    /// Returns `true` if there are no rooms.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes a room along with every edge touching it.
    pub fn remove_room(&mut self, index: RoomIndex) -> Option<Room> {
        let room = self.rooms.get_mut(index.0)?.take()?;
        self.edges.retain(|e| e.from != index && e.to != index);
        Some(room)
    }

    /// Connects two rooms in both directions.
    ///
    /// `from → to` gets `side`; `to → from` gets the mirrored side. An edge
    /// identical to an existing one is not duplicated.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::RoomNotFound` for an unknown room and
    /// `StoreError::SelfConnection` when both ends are the same room.
    pub fn add_connection(
        &mut self,
        from: RoomIndex,
        to: RoomIndex,
        kind: ConnectionKind,
        side: Side,
    ) -> Result<RoomConnection, StoreError> {
        self.check(from)?;
        self.check(to)?;
        if from == to {
            return Err(StoreError::SelfConnection(from.0));
        }

        let forward = RoomConnection {
            from,
            to,
            kind,
            side,
        };
        let backward = RoomConnection {
            from: to,
            to: from,
            kind,
            side: side.mirrored(),
        };
        for edge in [forward, backward] {
            if !self.edges.contains(&edge) {
                self.edges.push(edge);
            }
        }
        Ok(forward)
    }

    /// Removes every edge between two rooms, in both directions.
    ///
    /// Returns the number of edges removed.
    pub fn remove_connection(&mut self, a: RoomIndex, b: RoomIndex) -> usize {
        let before = self.edges.len();
        self.edges
            .retain(|e| !((e.from == a && e.to == b) || (e.from == b && e.to == a)));
        before - self.edges.len()
    }

    /// Returns every edge leaving a room.
    #[must_use]
    pub fn connections(&self, room: RoomIndex) -> Vec<RoomConnection> {
        self.edges.iter().filter(|e| e.from == room).copied().collect()
    }

    /// Returns the edges leaving a room on one side.
    #[must_use]
    pub fn connections_on(&self, room: RoomIndex, side: Side) -> Vec<RoomConnection> {
        self.edges
            .iter()
            .filter(|e| e.from == room && e.side == side)
            .copied()
            .collect()
    }

    fn check(&self, index: RoomIndex) -> Result<(), StoreError> {
        self.room(index)
            .map(|_| ())
            .ok_or(StoreError::RoomNotFound(index.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph_with(names: &[&str]) -> (RoomGraph, Vec<RoomIndex>) {
        let mut graph = RoomGraph::default();
        let indices = names
            .iter()
            .map(|n| graph.add_room(Room::new(*n, "Room", GroupId::new())))
            .collect();
        (graph, indices)
    }

    #[test]
    fn sides_mirror() {
        assert_eq!(Side::Left.mirrored(), Side::Right);
        assert_eq!(Side::Right.mirrored(), Side::Left);
        assert_eq!(Side::Top.mirrored(), Side::Bottom);
        assert_eq!(Side::Bottom.mirrored(), Side::Top);
    }

    #[test]
    fn add_connection_is_symmetric() {
        let (mut graph, rooms) = graph_with(&["A", "B"]);
        let (a, b) = (rooms[0], rooms[1]);

        graph
            .add_connection(a, b, ConnectionKind::Door, Side::Left)
            .unwrap();

        let from_b = graph.connections(b);
        assert_eq!(from_b.len(), 1);
        assert_eq!(from_b[0].to, a);
        assert_eq!(from_b[0].side, Side::Right);
        assert_eq!(from_b[0].kind, ConnectionKind::Door);
    }

    #[test]
    fn repeated_add_does_not_duplicate() {
        let (mut graph, rooms) = graph_with(&["A", "B"]);
        for _ in 0..2 {
            graph
                .add_connection(rooms[0], rooms[1], ConnectionKind::Wall, Side::Top)
                .unwrap();
        }
        assert_eq!(graph.connections(rooms[0]).len(), 1);
        assert_eq!(graph.connections(rooms[1]).len(), 1);
    }

    #[test]
    fn remove_from_either_side_removes_both() {
        let (mut graph, rooms) = graph_with(&["A", "B"]);
        let (a, b) = (rooms[0], rooms[1]);
        graph
            .add_connection(a, b, ConnectionKind::OpenSpace, Side::Bottom)
            .unwrap();

        assert_eq!(graph.remove_connection(b, a), 2);
        assert!(graph.connections(a).is_empty());
        assert!(graph.connections(b).is_empty());
    }

    #[test]
    fn connections_on_filters_by_side() {
        let (mut graph, rooms) = graph_with(&["A", "B", "C"]);
        graph
            .add_connection(rooms[0], rooms[1], ConnectionKind::Door, Side::Left)
            .unwrap();
        graph
            .add_connection(rooms[0], rooms[2], ConnectionKind::HalfWall, Side::Top)
            .unwrap();

        let top = graph.connections_on(rooms[0], Side::Top);
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].to, rooms[2]);
    }

    #[test]
    fn removing_a_room_drops_its_edges_and_keeps_indices() {
        let (mut graph, rooms) = graph_with(&["A", "B", "C"]);
        graph
            .add_connection(rooms[0], rooms[1], ConnectionKind::Door, Side::Left)
            .unwrap();

        assert!(graph.remove_room(rooms[1]).is_some());
        assert!(graph.connections(rooms[0]).is_empty());
        assert_eq!(graph.room(rooms[2]).unwrap().name, "C");
        assert_eq!(graph.len(), 2);
        assert!(graph.remove_room(rooms[1]).is_none());
    }

    #[test]
    fn invalid_connections() {
        let (mut graph, rooms) = graph_with(&["A"]);
        assert!(matches!(
            graph.add_connection(rooms[0], rooms[0], ConnectionKind::Door, Side::Left),
            Err(StoreError::SelfConnection(0))
        ));
        assert!(matches!(
            graph.add_connection(rooms[0], RoomIndex(9), ConnectionKind::Door, Side::Left),
            Err(StoreError::RoomNotFound(9))
        ));
    }
}
