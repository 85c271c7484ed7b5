//! The map session: one explicitly constructed object owning the view, the
//! feature collection, the attached interactions, the delete controls and
//! the persistence bridge.

use crate::collection::FeatureCollection;
use crate::config::MapConfig;
use crate::controls::DeleteControls;
use crate::feature::{Feature, FeatureId};
use crate::geojson::{self, GeoJsonError};
use crate::geometry::{Geometry, GeometryKind, VertexRef};
use crate::input::{CLICK_TOLERANCE, MouseButton, PointerEvent};
use crate::interaction::{Interactions, ModifyHit, Sketch};
use crate::persistence::{LoadOutcome, Persistence};
use crate::storage::{Storage, StorageResult};
use crate::style::FeatureStyle;
use crate::tiles::TileSource;
use crate::view::{MapView, ZOOM_STEP};
use kurbo::{Point, Size};
use std::sync::Arc;
use uuid::Uuid;

/// Edit completions reported back to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapEvent {
    /// A new feature was drawn, given a delete control and saved.
    DrawEnd(FeatureId),
    /// A feature's geometry was changed and saved.
    ModifyEnd(FeatureId),
    /// A feature and its control were removed and the collection saved.
    Deleted(FeatureId),
}

/// What the primary pointer is doing.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Gesture {
    Idle,
    /// Pressed on empty map: becomes a click or a pan.
    Press {
        button: MouseButton,
        start: Point,
        last: Point,
        panning: bool,
    },
    /// Dragging a vertex with the modify tool.
    Modify { feature: FeatureId },
}

pub struct MapSession<S: Storage> {
    config: MapConfig,
    view: MapView,
    collection: FeatureCollection,
    interactions: Interactions,
    controls: DeleteControls,
    persistence: Persistence<S>,
    gesture: Gesture,
    /// Vertex under the pointer while idle.
    hovered: Option<(FeatureId, VertexRef)>,
}

impl<S: Storage> MapSession<S> {
    /// Start a session: build the view, restore stored features (with their
    /// delete controls) and attach the draw and modify tools.
    pub fn open(config: MapConfig, storage: Arc<S>) -> Self {
        let persistence = Persistence::from_config(storage, &config);
        let mut session = Self {
            view: config.view(),
            collection: FeatureCollection::new(),
            interactions: Interactions::new(),
            controls: DeleteControls::new(),
            persistence,
            gesture: Gesture::Idle,
            hovered: None,
            config,
        };
        session.load_stored();
        session.interactions.set_geometry_kind(session.config.default_kind);
        session
    }

    /// Read the slot into the (empty) collection. Returns the number restored.
    fn load_stored(&mut self) -> usize {
        match self.persistence.load() {
            Ok(LoadOutcome::Empty) => {
                log::info!("No stored features under '{}'", self.persistence.key());
                0
            }
            Ok(LoadOutcome::Restored(collection)) => {
                for feature in collection.ordered() {
                    self.controls.attach(feature);
                }
                let count = collection.len();
                self.collection = collection;
                log::info!("Restored {} features from '{}'", count, self.persistence.key());
                count
            }
            Ok(LoadOutcome::Corrupt(e)) => {
                log::warn!(
                    "Ignoring malformed payload under '{}': {}",
                    self.persistence.key(),
                    e
                );
                0
            }
            Err(e) => {
                log::error!("Failed to read '{}': {}", self.persistence.key(), e);
                0
            }
        }
    }

    /// Drop in-memory state and read the slot again.
    pub fn reload(&mut self) -> usize {
        self.reset_gesture();
        if let Some(draw) = self.interactions.draw_mut() {
            draw.abort();
        }
        self.collection.clear();
        self.controls.clear();
        self.load_stored()
    }

    /// Write the whole collection to storage.
    pub fn save(&mut self) -> StorageResult<()> {
        self.persistence.save(&self.collection)
    }

    /// Save, logging failures. The session stays usable either way.
    fn persist(&mut self) {
        if let Err(e) = self.save() {
            log::error!("Failed to save features: {}", e);
        }
    }

    /// Swap the draw tool for one drawing `kind`, and re-attach the modify tool.
    pub fn set_geometry_kind(&mut self, kind: GeometryKind) {
        self.reset_gesture();
        self.interactions.set_geometry_kind(kind);
        log::debug!("Drawing {}", kind);
    }

    pub fn geometry_kind(&self) -> GeometryKind {
        self.interactions
            .draw()
            .map(|d| d.kind())
            .unwrap_or(self.config.default_kind)
    }

    /// Route a pointer event. Returns the completed edit, if any.
    pub fn handle_pointer(&mut self, event: PointerEvent) -> Option<MapEvent> {
        match event {
            PointerEvent::Down { position, button } => {
                self.pointer_down(position, button);
                None
            }
            PointerEvent::Move { position } => {
                self.pointer_move(position);
                None
            }
            PointerEvent::Up { position, button } => self.pointer_up(position, button),
            PointerEvent::DoubleClick { .. } => self.finish_drawing(),
            PointerEvent::Scroll { position, delta } => {
                if delta.y != 0.0 {
                    self.view.zoom_at(position, (delta.y * ZOOM_STEP).exp2());
                }
                None
            }
        }
    }

    fn pointer_down(&mut self, position: Point, button: MouseButton) {
        if self.gesture != Gesture::Idle {
            return;
        }

        // While a sketch is in progress every press belongs to the draw tool
        let sketching = self.interactions.draw().is_some_and(|d| d.is_active());
        if button == MouseButton::Left && !sketching {
            let tolerance = self.config.pixel_tolerance;
            let grabbed = self.interactions.modify_mut().and_then(|m| {
                m.begin(&mut self.collection, &self.view, position, tolerance)
            });
            if let Some(feature) = grabbed {
                self.sync_control(feature);
                self.hovered = None;
                self.gesture = Gesture::Modify { feature };
                return;
            }
        }

        self.gesture = Gesture::Press {
            button,
            start: position,
            last: position,
            panning: false,
        };
    }

    fn pointer_move(&mut self, position: Point) {
        let lonlat = self.view.screen_to_lonlat(position);
        match &mut self.gesture {
            Gesture::Modify { feature } => {
                let feature = *feature;
                if let Some(modify) = self.interactions.modify_mut() {
                    modify.drag(&mut self.collection, lonlat);
                }
                self.sync_control(feature);
                return;
            }
            Gesture::Press {
                start,
                last,
                panning,
                ..
            } => {
                if !*panning && (position - *start).hypot() > CLICK_TOLERANCE {
                    *panning = true;
                }
                if *panning {
                    let delta = position - *last;
                    *last = position;
                    self.view.pan(delta);
                    return;
                }
            }
            Gesture::Idle => {
                self.hovered = self.interactions.modify().and_then(|m| {
                    match m.hit(&self.collection, &self.view, position, self.config.pixel_tolerance) {
                        Some(ModifyHit::Vertex { feature, vertex }) => Some((feature, vertex)),
                        _ => None,
                    }
                });
            }
        }

        if let Some(draw) = self.interactions.draw_mut() {
            draw.hover(lonlat);
        }
    }

    fn pointer_up(&mut self, position: Point, button: MouseButton) -> Option<MapEvent> {
        match self.gesture {
            Gesture::Modify { .. } if button == MouseButton::Left => {
                self.gesture = Gesture::Idle;
                let changed = self.interactions.modify_mut()?.end(&mut self.collection)?;
                self.sync_control(changed);
                self.persist();
                Some(MapEvent::ModifyEnd(changed))
            }
            Gesture::Press {
                button: pressed,
                panning,
                ..
            } if pressed == button => {
                self.gesture = Gesture::Idle;
                if panning || button != MouseButton::Left {
                    return None;
                }
                self.click(position)
            }
            _ => None,
        }
    }

    fn click(&mut self, position: Point) -> Option<MapEvent> {
        let lonlat = self.view.screen_to_lonlat(position);
        let tolerance = self.config.pixel_tolerance;
        let geometry = self
            .interactions
            .draw_mut()?
            .click(lonlat, &self.view, tolerance)?;
        Some(self.complete_drawing(geometry))
    }

    fn complete_drawing(&mut self, mut geometry: Geometry) -> MapEvent {
        geometry.wrap_into_world();
        let feature = Feature::new(geometry);
        let id = feature.id;
        self.controls.attach(&feature);
        self.collection.add(feature);
        self.persist();
        log::debug!("Drew feature {}", id);
        MapEvent::DrawEnd(id)
    }

    /// Finish the sketch if it has enough vertices.
    pub fn finish_drawing(&mut self) -> Option<MapEvent> {
        let geometry = self.interactions.draw_mut()?.finish()?;
        Some(self.complete_drawing(geometry))
    }

    /// Drop the last vertex of the sketch. Returns false when nothing was
    /// placed.
    pub fn undo_vertex(&mut self) -> bool {
        self.interactions
            .draw_mut()
            .is_some_and(|draw| draw.undo_vertex())
    }

    /// Discard the sketch and any vertex drag in progress.
    pub fn abort_drawing(&mut self) {
        if let Some(draw) = self.interactions.draw_mut() {
            draw.abort();
        }
        self.reset_gesture();
    }

    /// Pointer left the map: drop the sketch cursor and vertex highlight.
    pub fn clear_hover(&mut self) {
        if let Some(draw) = self.interactions.draw_mut() {
            draw.clear_hover();
        }
        self.hovered = None;
    }

    /// Cancel whatever the pointer is doing, restoring a dragged geometry.
    fn reset_gesture(&mut self) {
        if let Gesture::Modify { feature } = self.gesture {
            if let Some(modify) = self.interactions.modify_mut() {
                modify.cancel(&mut self.collection);
            }
            self.sync_control(feature);
        }
        self.gesture = Gesture::Idle;
        self.hovered = None;
    }

    fn sync_control(&mut self, id: FeatureId) {
        if let Some(feature) = self.collection.get(id) {
            self.controls.sync(feature);
        }
    }

    /// Remove a feature and its control, then save.
    pub fn delete_feature(&mut self, id: FeatureId) -> Option<MapEvent> {
        if matches!(self.gesture, Gesture::Modify { feature } if feature == id) {
            self.gesture = Gesture::Idle;
        }
        if let Some(modify) = self.interactions.modify_mut() {
            modify.forget(id);
        }
        if self.hovered.is_some_and(|(f, _)| f == id) {
            self.hovered = None;
        }

        self.controls.detach(id);
        self.collection.remove(id)?;
        self.persist();
        Some(MapEvent::Deleted(id))
    }

    /// Remove every feature and control, then save the empty collection.
    pub fn clear(&mut self) {
        self.abort_drawing();
        self.collection.clear();
        self.controls.clear();
        self.persist();
    }

    /// Append the features of a GeoJSON document, with controls, then save.
    /// Ids that collide with existing features are replaced.
    pub fn import_geojson(&mut self, text: &str) -> Result<usize, GeoJsonError> {
        let imported = geojson::decode(text, self.persistence.crs())?;
        let count = imported.len();
        for mut feature in imported.ordered().cloned() {
            if self.collection.contains(feature.id) {
                feature.id = Uuid::new_v4();
            }
            self.controls.attach(&feature);
            self.collection.add(feature);
        }
        if count > 0 {
            self.persist();
        }
        log::info!("Imported {} features", count);
        Ok(count)
    }

    /// The collection as indented GeoJSON in the storage frame.
    pub fn export_geojson(&self) -> Result<String, GeoJsonError> {
        geojson::encode_pretty(&self.collection, self.persistence.crs())
    }

    /// Center and zoom the view on all features.
    pub fn fit_to_features(&mut self, padding: f64) -> bool {
        match self.collection.bounds() {
            Some(bounds) => {
                self.view.fit_to_bounds(bounds, padding);
                true
            }
            None => false,
        }
    }

    /// The in-progress drawing, for rendering.
    pub fn sketch(&self) -> Option<Sketch> {
        if matches!(self.gesture, Gesture::Modify { .. }) {
            return None;
        }
        self.interactions.draw().and_then(|d| d.sketch())
    }

    /// Vertex being dragged, or under the pointer.
    pub fn hovered_vertex(&self) -> Option<(FeatureId, VertexRef)> {
        self.interactions
            .modify()
            .and_then(|m| m.dragged())
            .or(self.hovered)
    }

    /// Whether a sketch has vertices placed.
    pub fn is_drawing(&self) -> bool {
        self.interactions.draw().is_some_and(|d| d.is_active())
    }

    pub fn is_panning(&self) -> bool {
        matches!(self.gesture, Gesture::Press { panning: true, .. })
    }

    pub fn controls(&self) -> &DeleteControls {
        &self.controls
    }

    pub fn interactions(&self) -> &Interactions {
        &self.interactions
    }

    pub fn view(&self) -> &MapView {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut MapView {
        &mut self.view
    }

    pub fn set_viewport_size(&mut self, size: Size) {
        self.view.set_viewport_size(size);
    }

    pub fn collection(&self) -> &FeatureCollection {
        &self.collection
    }

    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    pub fn style(&self) -> &FeatureStyle {
        &self.config.style
    }

    pub fn tile_source(&self) -> &TileSource {
        &self.config.tiles
    }

    pub fn persistence(&self) -> &Persistence<S> {
        &self.persistence
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projection::Crs;
    use crate::storage::MemoryStorage;
    use kurbo::Vec2;

    const INDIA: Point = Point::new(78.9629, 20.5937);

    fn open_with(storage: Arc<MemoryStorage>) -> MapSession<MemoryStorage> {
        let mut session = MapSession::open(MapConfig::default(), storage);
        session.set_viewport_size(Size::new(800.0, 600.0));
        session
    }

    fn click(session: &mut MapSession<MemoryStorage>, lonlat: Point) -> Option<MapEvent> {
        let position = session.view().lonlat_to_screen(lonlat);
        session.handle_pointer(PointerEvent::Down {
            position,
            button: MouseButton::Left,
        });
        session.handle_pointer(PointerEvent::Up {
            position,
            button: MouseButton::Left,
        })
    }

    fn stored(storage: &MemoryStorage) -> FeatureCollection {
        let payload = storage.get("features").unwrap();
        geojson::decode(&payload, Crs::Epsg4326).unwrap()
    }

    fn draw_polygon(session: &mut MapSession<MemoryStorage>, origin: Point) -> FeatureId {
        session.set_geometry_kind(GeometryKind::Polygon);
        click(session, origin);
        click(session, origin + Vec2::new(4.0, 0.0));
        click(session, origin + Vec2::new(2.0, 3.0));
        match click(session, origin) {
            Some(MapEvent::DrawEnd(id)) => id,
            other => panic!("expected DrawEnd, got {:?}", other),
        }
    }

    #[test]
    fn test_fresh_load_is_empty() {
        let storage = Arc::new(MemoryStorage::new());
        let session = open_with(storage.clone());
        assert!(session.collection().is_empty());
        assert!(session.controls().is_empty());
        assert_eq!(session.geometry_kind(), GeometryKind::Point);
        // Opening does not write
        assert!(storage.is_empty());
    }

    #[test]
    fn test_draw_point_is_saved() {
        let storage = Arc::new(MemoryStorage::new());
        let mut session = open_with(storage.clone());

        let event = click(&mut session, INDIA);
        let Some(MapEvent::DrawEnd(id)) = event else {
            panic!("expected DrawEnd, got {:?}", event);
        };
        assert_eq!(session.collection().len(), 1);
        assert_eq!(session.collection().get(id).unwrap().kind(), GeometryKind::Point);
        assert!(session.controls().contains(id));

        let saved = stored(&storage);
        assert_eq!(saved.len(), 1);
        let p = saved.get(id).unwrap().geometry.first_coordinate().unwrap();
        assert!((p.x - INDIA.x).abs() < 1e-6 && (p.y - INDIA.y).abs() < 1e-6, "{:?}", p);
    }

    #[test]
    fn test_delete_first_of_two_polygons() {
        let storage = Arc::new(MemoryStorage::new());
        let mut session = open_with(storage.clone());

        let first = draw_polygon(&mut session, Point::new(70.0, 15.0));
        let second = draw_polygon(&mut session, Point::new(82.0, 22.0));
        assert_eq!(session.collection().len(), 2);
        assert_eq!(session.controls().len(), 2);

        assert_eq!(session.delete_feature(first), Some(MapEvent::Deleted(first)));
        assert_eq!(session.collection().ids(), &[second]);
        assert!(!session.controls().contains(first));

        let saved = stored(&storage);
        assert_eq!(saved.ids(), &[second]);
        assert_eq!(saved.get(second).unwrap().kind(), GeometryKind::Polygon);

        // Deleting again is a no-op
        assert_eq!(session.delete_feature(first), None);
    }

    #[test]
    fn test_drag_line_vertex_updates_payload() {
        let storage = Arc::new(MemoryStorage::new());
        let mut session = open_with(storage.clone());
        session.set_geometry_kind(GeometryKind::LineString);

        let a = Point::new(75.0, 18.0);
        let b = Point::new(82.0, 23.0);
        click(&mut session, a);
        click(&mut session, b);
        let Some(MapEvent::DrawEnd(id)) = click(&mut session, b) else {
            panic!("line not finished");
        };

        let from = session.view().lonlat_to_screen(b);
        let to = from + Vec2::new(30.0, 40.0);
        let target = session.view().screen_to_lonlat(to);
        session.handle_pointer(PointerEvent::Down {
            position: from,
            button: MouseButton::Left,
        });
        assert_eq!(session.hovered_vertex(), Some((id, VertexRef::new(0, 1))));
        session.handle_pointer(PointerEvent::Move { position: to });
        let event = session.handle_pointer(PointerEvent::Up {
            position: to,
            button: MouseButton::Left,
        });
        assert_eq!(event, Some(MapEvent::ModifyEnd(id)));
        assert_eq!(session.collection().len(), 1);

        let saved = stored(&storage);
        assert_eq!(saved.len(), 1);
        let moved = saved.get(id).unwrap().geometry.vertex(VertexRef::new(0, 1)).unwrap();
        assert!((moved.x - target.x).abs() < 1e-6 && (moved.y - target.y).abs() < 1e-6);
    }

    #[test]
    fn test_dragging_first_vertex_moves_control() {
        let storage = Arc::new(MemoryStorage::new());
        let mut session = open_with(storage);
        let Some(MapEvent::DrawEnd(id)) = click(&mut session, INDIA) else {
            panic!("point not drawn");
        };
        let from = session.view().lonlat_to_screen(INDIA);
        let to = from + Vec2::new(-50.0, 20.0);
        session.handle_pointer(PointerEvent::Down {
            position: from,
            button: MouseButton::Left,
        });
        session.handle_pointer(PointerEvent::Move { position: to });
        let anchor = session.controls().get(id).unwrap().screen_position(session.view());
        assert!((anchor - to).hypot() < 1e-6);
    }

    #[test]
    fn test_save_twice_is_identical() {
        let storage = Arc::new(MemoryStorage::new());
        let mut session = open_with(storage.clone());
        draw_polygon(&mut session, Point::new(70.0, 15.0));
        session.save().unwrap();
        let first = storage.get("features").unwrap();
        session.save().unwrap();
        assert_eq!(storage.get("features").unwrap(), first);
    }

    #[test]
    fn test_reopen_restores_features_with_controls() {
        let storage = Arc::new(MemoryStorage::new());
        let mut session = open_with(storage.clone());
        click(&mut session, INDIA);
        let polygon = draw_polygon(&mut session, Point::new(70.0, 15.0));
        let ids = session.collection().ids().to_vec();
        drop(session);

        let session = open_with(storage);
        assert_eq!(session.collection().ids(), ids.as_slice());
        assert_eq!(session.controls().len(), 2);
        assert_eq!(
            session.collection().get(polygon).unwrap().geometry.vertex_count(),
            3
        );
    }

    #[test]
    fn test_malformed_storage_starts_empty() {
        let storage = Arc::new(MemoryStorage::with_entry("features", "<<garbage>>"));
        let mut session = open_with(storage.clone());
        assert!(session.collection().is_empty());
        // The payload is only replaced on the next save
        assert_eq!(storage.get("features").unwrap(), "<<garbage>>");
        click(&mut session, INDIA);
        assert_eq!(stored(&storage).len(), 1);
    }

    #[test]
    fn test_geometry_switch_keeps_one_tool_pair() {
        let storage = Arc::new(MemoryStorage::new());
        let mut session = open_with(storage);
        for kind in ["Polygon", "LineString", "Point", "Polygon"] {
            session.set_geometry_kind(kind.parse().unwrap());
            assert_eq!(session.interactions().draw_count(), 1);
            assert_eq!(session.interactions().modify_count(), 1);
            assert_eq!(session.geometry_kind().name(), kind);
        }
    }

    #[test]
    fn test_switch_discards_sketch() {
        let storage = Arc::new(MemoryStorage::new());
        let mut session = open_with(storage);
        session.set_geometry_kind(GeometryKind::Polygon);
        click(&mut session, Point::new(70.0, 15.0));
        assert!(session.is_drawing());
        session.set_geometry_kind(GeometryKind::LineString);
        assert!(!session.is_drawing());
    }

    #[test]
    fn test_double_click_and_keyboard_finish() {
        let storage = Arc::new(MemoryStorage::new());
        let mut session = open_with(storage);
        session.set_geometry_kind(GeometryKind::LineString);
        click(&mut session, Point::new(70.0, 15.0));
        click(&mut session, Point::new(75.0, 15.0));
        click(&mut session, Point::new(80.0, 18.0));
        let position = session.view().lonlat_to_screen(Point::new(80.0, 18.0));
        let event = session.handle_pointer(PointerEvent::DoubleClick { position });
        let Some(MapEvent::DrawEnd(id)) = event else {
            panic!("expected DrawEnd");
        };
        assert_eq!(session.collection().get(id).unwrap().geometry.vertex_count(), 3);

        click(&mut session, Point::new(60.0, 10.0));
        assert!(session.finish_drawing().is_none());
        session.abort_drawing();
        assert!(!session.is_drawing());
        assert_eq!(session.collection().len(), 1);
    }

    #[test]
    fn test_undo_vertex_while_drawing() {
        let storage = Arc::new(MemoryStorage::new());
        let mut session = open_with(storage);
        assert!(!session.undo_vertex());

        session.set_geometry_kind(GeometryKind::LineString);
        click(&mut session, Point::new(70.0, 15.0));
        click(&mut session, Point::new(75.0, 15.0));
        click(&mut session, Point::new(80.0, 18.0));
        assert!(session.undo_vertex());
        let Some(MapEvent::DrawEnd(id)) = session.finish_drawing() else {
            panic!("expected DrawEnd");
        };
        assert_eq!(session.collection().get(id).unwrap().geometry.vertex_count(), 2);
        assert!(!session.undo_vertex());
    }

    #[test]
    fn test_drag_on_empty_map_pans() {
        let storage = Arc::new(MemoryStorage::new());
        let mut session = open_with(storage.clone());
        let center = session.view().center();
        let start = Point::new(400.0, 300.0);
        session.handle_pointer(PointerEvent::Down {
            position: start,
            button: MouseButton::Left,
        });
        session.handle_pointer(PointerEvent::Move {
            position: start + Vec2::new(100.0, 0.0),
        });
        assert!(session.is_panning());
        let event = session.handle_pointer(PointerEvent::Up {
            position: start + Vec2::new(100.0, 0.0),
            button: MouseButton::Left,
        });
        assert_eq!(event, None);
        assert!(session.collection().is_empty());
        assert!(session.view().center().x < center.x);
        assert!(storage.is_empty());
    }

    #[test]
    fn test_draw_after_panning_a_world_width() {
        let storage = Arc::new(MemoryStorage::new());
        let mut session = open_with(storage.clone());
        let world = session.view().world_size();
        session.view_mut().pan(Vec2::new(-world, 0.0));
        assert!((-180.0..180.0).contains(&session.view().center().x));

        let Some(MapEvent::DrawEnd(first)) = click(&mut session, INDIA) else {
            panic!("point not drawn");
        };

        // Past the antimeridian, seen from just west of it
        session.view_mut().set_center(Point::new(175.0, 0.0));
        let Some(MapEvent::DrawEnd(second)) = click(&mut session, Point::new(185.0, 0.0)) else {
            panic!("point not drawn");
        };

        let saved = stored(&storage);
        for id in [first, second] {
            let p = saved.get(id).unwrap().geometry.first_coordinate().unwrap();
            assert!((-180.0..=180.0).contains(&p.x), "{:?}", p);
        }
        let p = saved.get(second).unwrap().geometry.first_coordinate().unwrap();
        assert!((p.x + 175.0).abs() < 1e-6, "{:?}", p);

        // Still drawn and hit where it was clicked
        let screen = session.view().lonlat_to_screen(Point::new(185.0, 0.0));
        let hits = session.collection().features_at(session.view(), screen, 6.0);
        assert_eq!(hits, vec![second]);
    }

    #[test]
    fn test_scroll_zooms() {
        let storage = Arc::new(MemoryStorage::new());
        let mut session = open_with(storage);
        session.handle_pointer(PointerEvent::Scroll {
            position: Point::new(400.0, 300.0),
            delta: Vec2::new(0.0, 2.0),
        });
        assert!((session.view().zoom() - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_import_export_and_clear() {
        let storage = Arc::new(MemoryStorage::new());
        let mut session = open_with(storage.clone());
        click(&mut session, INDIA);
        let exported = session.export_geojson().unwrap();

        // Re-importing the same document duplicates with fresh ids
        assert_eq!(session.import_geojson(&exported).unwrap(), 1);
        assert_eq!(session.collection().len(), 2);
        assert_eq!(session.controls().len(), 2);
        assert_eq!(stored(&storage).len(), 2);

        assert!(session.import_geojson("nope").is_err());
        assert_eq!(session.collection().len(), 2);

        session.clear();
        assert!(session.collection().is_empty());
        assert!(session.controls().is_empty());
        assert!(stored(&storage).is_empty());
    }

    #[test]
    fn test_reload_picks_up_external_changes() {
        let storage = Arc::new(MemoryStorage::new());
        let mut session = open_with(storage.clone());
        click(&mut session, INDIA);
        storage.remove("features").unwrap();
        assert_eq!(session.reload(), 0);
        assert!(session.collection().is_empty());
        assert!(session.controls().is_empty());
    }

    #[test]
    fn test_fit_to_features() {
        let storage = Arc::new(MemoryStorage::new());
        let mut session = open_with(storage);
        assert!(!session.fit_to_features(20.0));
        draw_polygon(&mut session, Point::new(70.0, 15.0));
        assert!(session.fit_to_features(20.0));
        assert!(session.view().zoom() > 4.0);
    }
}
