#![allow(clippy::unwrap_used, clippy::expect_used)]

//! End-to-end flow: wire a conversion service and a repository set into a
//! resolver, then drive a simulated query invocation through the parameter
//! accessor — the way a query-dispatch layer would.

use std::collections::BTreeMap;
use std::sync::Arc;

use querykit::params::{
    any_value, AnyValue, Page, PageInfo, PageRequest, ParameterAccessor, ParameterRole, Parameters,
    Sort, SortDir,
};
use querykit::{
    ConversionService, ConvertError, DomainEntity, DomainResolver, PagingRepository, Repository,
    RepositorySet, TypeKey,
};

#[derive(Clone, Debug, PartialEq)]
struct Track {
    id: u64,
    title: String,
    artist: String,
}

impl DomainEntity for Track {
    type Id = u64;
}

#[derive(Clone, Debug, PartialEq)]
struct Playlist {
    slug: String,
    name: String,
}

impl DomainEntity for Playlist {
    type Id = String;
}

struct TrackStore(BTreeMap<u64, Track>);

impl TrackStore {
    fn seeded() -> Arc<Self> {
        let tracks = [
            (1, "Paranoid Android", "Radiohead"),
            (2, "Alameda", "Elliott Smith"),
            (3, "Holland, 1945", "Neutral Milk Hotel"),
        ];
        let map = tracks
            .into_iter()
            .map(|(id, title, artist)| {
                (
                    id,
                    Track {
                        id,
                        title: title.to_owned(),
                        artist: artist.to_owned(),
                    },
                )
            })
            .collect();
        Arc::new(Self(map))
    }
}

impl Repository<Track> for TrackStore {
    fn find_by_id(&self, id: &u64) -> anyhow::Result<Option<Track>> {
        Ok(self.0.get(id).cloned())
    }
}

impl PagingRepository<Track> for TrackStore {
    fn find_page(&self, request: &PageRequest) -> anyhow::Result<Page<Track>> {
        let mut tracks: Vec<Track> = self.0.values().cloned().collect();
        if request
            .sort()
            .keys()
            .iter()
            .any(|key| key.field == "title")
        {
            tracks.sort_by(|a, b| a.title.cmp(&b.title));
            if request.sort().keys()[0].dir == SortDir::Desc {
                tracks.reverse();
            }
        }
        let start = usize::try_from(request.offset())?.min(tracks.len());
        let end = (start + usize::try_from(request.size())?).min(tracks.len());
        let total = self.0.len() as u64;
        Ok(Page::new(
            tracks[start..end].to_vec(),
            PageInfo::of(request, total),
        ))
    }
}

struct PlaylistStore(BTreeMap<String, Playlist>);

impl PlaylistStore {
    fn seeded() -> Arc<Self> {
        let mut map = BTreeMap::new();
        map.insert(
            "morning".to_owned(),
            Playlist {
                slug: "morning".to_owned(),
                name: "Morning Commute".to_owned(),
            },
        );
        Arc::new(Self(map))
    }
}

impl Repository<Playlist> for PlaylistStore {
    fn find_by_id(&self, id: &String) -> anyhow::Result<Option<Playlist>> {
        Ok(self.0.get(id).cloned())
    }
}

fn wire() -> (Arc<DomainResolver>, Arc<ConversionService>) {
    let service = Arc::new(ConversionService::with_defaults());
    service.register(|raw: &String| {
        raw.parse::<u64>()
            .map_err(|e| ConvertError::failed(TypeKey::of::<u64>(), e.to_string()))
    });

    let resolver = Arc::new(DomainResolver::new(service.clone()));
    let repositories = RepositorySet::new()
        .with::<Track, _>(TrackStore::seeded())
        .with::<Playlist, _>(PlaylistStore::seeded());
    resolver.initialize(&repositories);

    (resolver, service)
}

#[test]
fn resolves_entities_from_path_variable_strings() {
    let (resolver, _service) = wire();

    // A path variable like "/tracks/2" arrives as a string.
    let track = resolver
        .resolve::<String, Track>("2".to_owned())
        .unwrap()
        .unwrap();
    assert_eq!(track.artist, "Elliott Smith");

    // Playlist ids are strings already; the identity rule covers them.
    let playlist = resolver
        .resolve::<String, Playlist>("morning".to_owned())
        .unwrap()
        .unwrap();
    assert_eq!(playlist.slug, "morning");
    assert_eq!(playlist.name, "Morning Commute");

    // Unknown identifiers resolve to nothing, not to an error.
    assert!(resolver
        .resolve::<String, Track>("42".to_owned())
        .unwrap()
        .is_none());
}

#[test]
fn resolver_participates_in_the_shared_conversion_service() {
    let (resolver, service) = wire();

    assert!(resolver.can_convert(&TypeKey::of::<String>(), &TypeKey::of::<Track>()));
    assert!(service.can_convert(&TypeKey::of::<String>(), &TypeKey::of::<Playlist>()));

    let converted = service
        .convert(
            &any_value("3".to_owned()),
            &TypeKey::of::<String>(),
            &TypeKey::of::<Track>(),
        )
        .unwrap();
    assert_eq!(
        converted.downcast_ref::<Track>().map(|t| t.title.as_str()),
        Some("Holland, 1945")
    );
}

#[test]
fn accessor_feeds_a_paged_query_invocation() {
    let (resolver, _service) = wire();

    // Simulated query method: find_by_artist(artist, pageable).
    let shape = Arc::new(
        Parameters::new([ParameterRole::Bindable, ParameterRole::Pageable]).unwrap(),
    );
    let values: Vec<Option<AnyValue>> = vec![
        Some(any_value("Radiohead".to_owned())),
        Some(any_value(
            PageRequest::new(0, 2).with_sort(Sort::asc("title")),
        )),
    ];
    let accessor = ParameterAccessor::new(shape, values).unwrap();

    // The dispatch layer pulls the window and the bind values apart.
    assert!(!accessor.has_bindable_null());
    let artist = accessor.bindable_value(0).unwrap().unwrap();
    assert_eq!(artist.downcast_ref::<String>().unwrap(), "Radiohead");
    assert_eq!(accessor.sort(), Some(&Sort::asc("title")));

    let request = accessor.pageable().unwrap();
    let page = TrackStore::seeded().find_page(request).unwrap();
    let titles: Vec<_> = page.items.iter().map(|t| t.title.as_str()).collect();
    assert_eq!(titles, vec!["Alameda", "Holland, 1945"]);
    assert_eq!(page.info.total_pages, 2);

    // And the resolver is still available for id-shaped bind values.
    let track = resolver
        .resolve::<String, Track>("1".to_owned())
        .unwrap()
        .unwrap();
    assert_eq!(track.id, 1);
    assert_eq!(track.title, "Paranoid Android");
}

#[test]
fn null_bindable_values_short_circuit_before_execution() {
    let shape = Arc::new(
        Parameters::new([
            ParameterRole::Bindable,
            ParameterRole::Sort,
            ParameterRole::Bindable,
        ])
        .unwrap(),
    );
    let values: Vec<Option<AnyValue>> = vec![
        Some(any_value("Radiohead".to_owned())),
        Some(any_value(Sort::desc("title"))),
        None,
    ];
    let accessor = ParameterAccessor::new(shape, values).unwrap();

    // A dispatcher refusing null-unsafe execution checks this first.
    assert!(accessor.has_bindable_null());
    assert_eq!(accessor.sort(), Some(&Sort::desc("title")));

    let collected: Vec<bool> = accessor
        .bindable_values()
        .map(|value| value.is_some())
        .collect();
    assert_eq!(collected, vec![true, false]);
}
