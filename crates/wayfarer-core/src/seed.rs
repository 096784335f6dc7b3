use wayfarer_db::destinations::{upsert_destination_by_slug, Highlight};
use wayfarer_db::DbPool;

use crate::error::CoreError;
use crate::slugify;

struct SeedDestination {
    name: &'static str,
    description: &'static str,
    history: &'static str,
    image: &'static str,
    highlights: &'static [(&'static str, &'static str)],
    gallery: &'static [&'static str],
}

const SEED: &[SeedDestination] = &[
    SeedDestination {
        name: "Gorée Island",
        description: "A small island off Dakar, known for its pastel colonial houses \
                      and car-free cobbled lanes.",
        history: "A major memorial site of the Atlantic slave trade, home to the \
                  House of Slaves museum.",
        image: "/api/uploads/seed/goree.jpg",
        highlights: &[
            ("House of Slaves", "Eighteenth-century memorial and museum"),
            ("Fort d'Estrées", "Coastal battery housing the IFAN historical museum"),
        ],
        gallery: &["/api/uploads/seed/goree-1.jpg", "/api/uploads/seed/goree-2.jpg"],
    },
    SeedDestination {
        name: "Saint-Louis",
        description: "Former capital at the mouth of the Senegal River, celebrated \
                      for its island old town and jazz festival.",
        history: "Founded in 1659 as the first French settlement in West Africa; \
                  UNESCO-listed since 2000.",
        image: "/api/uploads/seed/saint-louis.jpg",
        highlights: &[
            ("Faidherbe Bridge", "Iron road bridge linking the island to the mainland"),
            ("Guet N'Dar", "Fishing quarter on the Langue de Barbarie spit"),
        ],
        gallery: &["/api/uploads/seed/saint-louis-1.jpg"],
    },
    SeedDestination {
        name: "Lac Rose",
        description: "Shallow lagoon north of Dakar whose algae turn the water pink \
                      in the dry season.",
        history: "Long the terminus of the Dakar Rally; salt has been harvested \
                  here by hand for generations.",
        image: "/api/uploads/seed/lac-rose.jpg",
        highlights: &[("Salt flats", "Traditional pirogue-based salt harvesting")],
        gallery: &[],
    },
];

/// Upsert the curated destination catalog, keyed by slug. Safe to run on
/// every boot; existing rows are refreshed, never duplicated.
pub async fn seed_destinations(pool: &DbPool) -> Result<usize, CoreError> {
    for dest in SEED {
        let slug = slugify(dest.name);
        let highlights: Vec<Highlight> = dest
            .highlights
            .iter()
            .map(|(name, description)| Highlight {
                name: (*name).to_string(),
                description: (*description).to_string(),
            })
            .collect();
        let gallery: Vec<String> = dest.gallery.iter().map(|g| (*g).to_string()).collect();

        upsert_destination_by_slug(
            pool,
            dest.name,
            Some(dest.description),
            Some(dest.history),
            Some(dest.image),
            &slug,
            &highlights,
            &gallery,
        )
        .await?;
    }
    tracing::info!(count = SEED.len(), "destination catalog seeded");
    Ok(SEED.len())
}
