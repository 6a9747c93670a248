//! SurrealDB returns record ids as a `Thing` (`table:id`) on `SELECT *`, but
//! as a bare scalar on `CREATE`/`UPDATE` `RETURN` clauses depending on the
//! query shape. These `deserialize_with` helpers accept either form, the
//! same flexible-id pattern the teacher's `stored_object!` macro uses.
use serde::de::{self, Deserialize, Visitor};
use serde::Deserializer;
use surrealdb::sql::Thing;

struct FlexibleStringIdVisitor;

impl<'de> Visitor<'de> for FlexibleStringIdVisitor {
    type Value = String;

    fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
        formatter.write_str("a string or a Thing")
    }

    fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(value.to_string())
    }

    fn visit_string<E>(self, value: String) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(value)
    }

    fn visit_map<A>(self, map: A) -> Result<Self::Value, A::Error>
    where
        A: de::MapAccess<'de>,
    {
        let thing = Thing::deserialize(de::value::MapAccessDeserializer::new(map))?;
        Ok(thing.id.to_raw())
    }
}

pub fn deserialize_string_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_any(FlexibleStringIdVisitor)
}

struct FlexibleNumericIdVisitor;

impl<'de> Visitor<'de> for FlexibleNumericIdVisitor {
    type Value = i64;

    fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
        formatter.write_str("an integer or a Thing with a numeric id")
    }

    fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(value)
    }

    fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(value as i64)
    }

    fn visit_map<A>(self, map: A) -> Result<Self::Value, A::Error>
    where
        A: de::MapAccess<'de>,
    {
        let thing = Thing::deserialize(de::value::MapAccessDeserializer::new(map))?;
        thing
            .id
            .to_raw()
            .parse::<i64>()
            .map_err(de::Error::custom)
    }
}

pub fn deserialize_numeric_id<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_any(FlexibleNumericIdVisitor)
}
