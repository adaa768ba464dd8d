//! Sample data for demos and local development.
//!
//! Loading is idempotent: a data set is skipped when its target table
//! already has rows.

use chrono::NaiveDate;
use sqlx::PgConnection;
use workshop_core::tenant::TenantId;

use crate::models::actor::CreateActor;
use crate::models::country::Country;
use crate::models::movie::CreateMovie;
use crate::repositories::{ActorRepo, CountryRepo, MovieRepo};

/// Which localized movie catalog to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleLocale {
    English,
    Korean,
}

impl SampleLocale {
    pub fn for_tenant(tenant: &TenantId) -> Self {
        if tenant.as_str() == "korean" {
            SampleLocale::Korean
        } else {
            SampleLocale::English
        }
    }
}

struct SampleActor {
    first_name: &'static str,
    last_name: &'static str,
    birthday: Option<(i32, u32, u32)>,
}

struct SampleMovie {
    name: &'static str,
    producer_name: &'static str,
    release_date: (i32, u32, u32),
    /// Indexes into the actor list of the same locale.
    cast: &'static [usize],
}

const ENGLISH_ACTORS: &[SampleActor] = &[
    SampleActor { first_name: "Johnny", last_name: "Depp", birthday: Some((1963, 6, 9)) },
    SampleActor { first_name: "Bradley", last_name: "Cooper", birthday: Some((1975, 1, 5)) },
    SampleActor { first_name: "Sophie", last_name: "Turner", birthday: None },
    SampleActor { first_name: "Angelina", last_name: "Jolie", birthday: Some((1975, 6, 4)) },
    SampleActor { first_name: "Jennifer", last_name: "Garner", birthday: Some((1972, 4, 17)) },
    SampleActor { first_name: "Ryan", last_name: "Reynolds", birthday: Some((1976, 10, 23)) },
];

const ENGLISH_MOVIES: &[SampleMovie] = &[
    SampleMovie { name: "Gladiator", producer_name: "Johnny", release_date: (2000, 5, 1), cast: &[0, 1, 2] },
    SampleMovie { name: "Guardians of the galaxy", producer_name: "Johnny", release_date: (2014, 7, 21), cast: &[1, 3, 4] },
    SampleMovie { name: "Fight club", producer_name: "Angelina", release_date: (1999, 9, 13), cast: &[3, 4] },
    SampleMovie { name: "13 Going On 30", producer_name: "Jennifer", release_date: (2004, 6, 2), cast: &[4] },
    SampleMovie { name: "Gone Girl", producer_name: "Bradley", release_date: (2014, 9, 26), cast: &[] },
];

const KOREAN_ACTORS: &[SampleActor] = &[
    SampleActor { first_name: "강호", last_name: "송", birthday: Some((1967, 1, 17)) },
    SampleActor { first_name: "정재", last_name: "이", birthday: Some((1972, 12, 15)) },
    SampleActor { first_name: "소담", last_name: "박", birthday: None },
    SampleActor { first_name: "혜수", last_name: "김", birthday: Some((1970, 9, 5)) },
    SampleActor { first_name: "정민", last_name: "황", birthday: Some((1970, 9, 1)) },
];

const KOREAN_MOVIES: &[SampleMovie] = &[
    SampleMovie { name: "기생충", producer_name: "강호", release_date: (2019, 5, 30), cast: &[0, 2] },
    SampleMovie { name: "관상", producer_name: "정재", release_date: (2013, 9, 11), cast: &[0, 1, 3] },
    SampleMovie { name: "타짜", producer_name: "혜수", release_date: (2006, 9, 28), cast: &[3] },
    SampleMovie { name: "신세계", producer_name: "정재", release_date: (2013, 2, 21), cast: &[1, 4] },
];

fn date((y, m, d): (i32, u32, u32)) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(y, m, d)
}

/// Load the sample movie catalog unless actors already exist.
///
/// Expects to run inside a transaction; returns whether anything was loaded.
pub async fn seed_movies(conn: &mut PgConnection, locale: SampleLocale) -> Result<bool, sqlx::Error> {
    if ActorRepo::count(&mut *conn).await? > 0 {
        tracing::debug!(?locale, "Sample movies already present, skipping");
        return Ok(false);
    }

    let (actors, movies) = match locale {
        SampleLocale::English => (ENGLISH_ACTORS, ENGLISH_MOVIES),
        SampleLocale::Korean => (KOREAN_ACTORS, KOREAN_MOVIES),
    };

    let mut actor_ids = Vec::with_capacity(actors.len());
    for actor in actors {
        let input = CreateActor {
            first_name: actor.first_name.to_string(),
            last_name: actor.last_name.to_string(),
            birthday: actor.birthday.and_then(date),
        };
        actor_ids.push(ActorRepo::create(&mut *conn, &input).await?.id);
    }

    for movie in movies {
        let Some(release_date) = date(movie.release_date) else {
            continue;
        };
        let input = CreateMovie {
            name: movie.name.to_string(),
            producer_name: movie.producer_name.to_string(),
            release_date,
            actors: Vec::new(),
            actor_ids: movie.cast.iter().map(|&i| actor_ids[i]).collect(),
        };
        MovieRepo::create_with_actors(&mut *conn, &input).await?;
    }

    Ok(true)
}

const COUNTRIES: &[(&str, &str, &str)] = &[
    ("KR", "South Korea", "Republic of Korea"),
    ("US", "United States", "United States of America"),
    ("JP", "Japan", "State of Japan"),
    ("DE", "Germany", "Federal Republic of Germany"),
    ("FR", "France", "French Republic"),
    ("GB", "United Kingdom", "United Kingdom of Great Britain and Northern Ireland"),
];

/// Load the sample country list. Existing codes are overwritten.
pub async fn seed_countries(conn: &mut PgConnection) -> Result<usize, sqlx::Error> {
    for (code, name, description) in COUNTRIES {
        let country = Country {
            code: code.to_string(),
            name: name.to_string(),
            description: Some(description.to_string()),
        };
        CountryRepo::upsert(&mut *conn, &country).await?;
    }
    Ok(COUNTRIES.len())
}
